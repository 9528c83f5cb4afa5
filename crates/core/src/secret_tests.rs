// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    openai_key = { "sk-1234567890abcdef", "sk-1****" },
    bot_token  = { "123456789:ABCdefGHIjkl", "1234****" },
    short      = { "tok1", "****" },
    eight      = { "abcdefgh", "****" },
    empty      = { "", "****" },
    multibyte  = { "ключ-секрет-значение", "ключ****" },
)]
fn masked_keeps_short_prefix(raw: &str, expected: &str) {
    assert_eq!(Secret::new(raw).masked(), expected);
}

#[test]
fn debug_and_display_never_contain_raw_value() {
    let secret = Secret::new("sk-live-very-secret-value");
    let debug = format!("{:?}", secret);
    let display = format!("{}", secret);
    assert!(!debug.contains("very-secret"), "got: {debug}");
    assert!(!display.contains("very-secret"), "got: {display}");
    assert_eq!(display, "sk-l****");
}

#[test]
fn expose_returns_raw_value() {
    let secret = Secret::from("sk-1");
    assert_eq!(secret.expose(), "sk-1");
}

#[test]
fn redact_replaces_all_occurrences() {
    let secret = Secret::new("sk-abcdefghijkl");
    let text = "python main.py --openai-key sk-abcdefghijkl --again sk-abcdefghijkl";
    let redacted = secret.redact(text);
    assert!(!redacted.contains("sk-abcdefghijkl"));
    assert_eq!(redacted.matches("sk-a****").count(), 2);
}

#[test]
fn redact_with_empty_secret_is_identity() {
    assert_eq!(Secret::default().redact("hello"), "hello");
}

#[test]
fn serde_round_trips_raw_value() {
    let json = serde_json::to_string(&Secret::new("tok1")).unwrap();
    assert_eq!(json, "\"tok1\"");
    let back: Secret = serde_json::from_str(&json).unwrap();
    assert_eq!(back.expose(), "tok1");
}

#[test]
fn redactor_masks_every_credential() {
    let redactor = Redactor::new([
        Secret::new("123456:SECRETTOKEN"),
        Secret::new("sk-secretmodelkey"),
    ]);
    let text = "GET https://api.telegram.org/bot123456:SECRETTOKEN/getMe key=sk-secretmodelkey";
    assert_eq!(
        redactor.redact(text),
        "GET https://api.telegram.org/bot1234****/getMe key=sk-s****"
    );
}

#[yare::parameterized(
    cut_at_end   = { "token is 123456:SECRE", "token is 1234****" },
    cut_at_start = { "56:SECRETTOKEN rejected", "**** rejected" },
    short_prefix = { "id 1234", "id 1234" },
    short_suffix = { "KEN rejected", "KEN rejected" },
)]
fn redactor_masks_credentials_cut_at_edges(text: &str, expected: &str) {
    let redactor = Redactor::new([Secret::new("123456:SECRETTOKEN")]);
    assert_eq!(redactor.redact(text), expected);
}

#[test]
fn empty_redactor_passes_text_through() {
    let redactor = Redactor::new([Secret::new("")]);
    assert_eq!(redactor.redact("plain output"), "plain output");
    assert_eq!(format!("{:?}", redactor), "Redactor { secrets: 0 }");
}
