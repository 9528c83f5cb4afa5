// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential wrapper that never prints its full value.
//!
//! `Debug` and `Display` render a short masked prefix (`sk-1****`), so a
//! `Secret` can be passed to `tracing` fields without leaking the token.
//! The raw value is only reachable through [`Secret::expose`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroize;

/// Number of leading characters kept visible in masked output.
pub const VISIBLE_PREFIX: usize = 4;

const MASK: &str = "****";

#[derive(Clone, PartialEq, Eq, Default)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw credential value. Only hand this to the worker process.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Masked form: the first few characters followed by `****`.
    ///
    /// Values too short to keep a prefix are fully masked.
    pub fn masked(&self) -> String {
        let count = self.0.chars().count();
        if count <= VISIBLE_PREFIX * 2 {
            return MASK.to_string();
        }
        let prefix: String = self.0.chars().take(VISIBLE_PREFIX).collect();
        format!("{prefix}{MASK}")
    }

    /// Replace every occurrence of the raw value in `text` with the masked form.
    pub fn redact(&self, text: &str) -> String {
        if self.0.is_empty() {
            return text.to_string();
        }
        text.replace(&self.0, &self.masked())
    }
}

/// Masks a fixed set of credentials in captured worker output.
///
/// Besides whole occurrences, a credential cut off at either end of the
/// text (as excerpts and bounded buffers do) is masked when more than
/// [`VISIBLE_PREFIX`] characters of it remain.
#[derive(Clone, Default)]
pub struct Redactor {
    secrets: Vec<Secret>,
}

impl Redactor {
    pub fn new(secrets: impl IntoIterator<Item = Secret>) -> Self {
        Self {
            secrets: secrets.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut out = text.to_string();
        for secret in &self.secrets {
            out = secret.redact(&out);
        }
        for secret in &self.secrets {
            out = mask_cut_edges(secret, out);
        }
        out
    }
}

impl fmt::Debug for Redactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Redactor")
            .field("secrets", &self.secrets.len())
            .finish()
    }
}

/// Mask a leading suffix or trailing prefix of `secret` in `text`.
fn mask_cut_edges(secret: &Secret, mut text: String) -> String {
    let raw = secret.expose();
    let min = VISIBLE_PREFIX + 1;

    let trailing = (min..raw.len())
        .rev()
        .filter(|&len| raw.is_char_boundary(len))
        .find(|&len| text.ends_with(&raw[..len]));
    if let Some(len) = trailing {
        text.truncate(text.len() - len);
        text.push_str(&secret.masked());
    }

    let leading = (min..raw.len())
        .rev()
        .filter(|&len| raw.is_char_boundary(raw.len() - len))
        .find(|&len| text.starts_with(&raw[raw.len() - len..]));
    if let Some(len) = leading {
        text.replace_range(..len, MASK);
    }
    text
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", self.masked())
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl From<String> for Secret {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// Serialized verbatim: the control socket and the tenant file must carry the
// real value. Logging goes through Debug/Display, which are masked.
impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Secret)
    }
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;
