// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Framing for the control socket.
//!
//! Every frame is a big-endian `u32` byte count followed by that many bytes
//! of JSON. Requests may carry credentials, so decode failures report only
//! where the payload went wrong, never its contents.

use std::future::Future;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{Request, Response};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot encode message: {0}")]
    Encode(serde_json::Error),

    #[error("malformed message ({category} error at line {line}, column {column})")]
    Malformed {
        category: &'static str,
        line: usize,
        column: usize,
    },

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout")]
    Timeout,
}

impl ProtocolError {
    fn malformed(e: &serde_json::Error) -> Self {
        let category = match e.classify() {
            serde_json::error::Category::Io => "io",
            serde_json::error::Category::Syntax => "syntax",
            serde_json::error::Category::Data => "data",
            serde_json::error::Category::Eof => "eof",
        };
        ProtocolError::Malformed {
            category,
            line: e.line(),
            column: e.column(),
        }
    }
}

/// Largest frame either side accepts (16 MiB).
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Per-frame read/write timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Exchanged in `Hello` and shown by `bf daemon status`.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

fn check_size(size: usize) -> Result<(), ProtocolError> {
    if size > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size,
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(())
}

async fn within<T>(
    timeout: Duration,
    fut: impl Future<Output = Result<T, ProtocolError>>,
) -> Result<T, ProtocolError> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

/// Serialize `msg` to a frame body (no length prefix).
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    let body = serde_json::to_vec(msg).map_err(ProtocolError::Encode)?;
    check_size(body.len())?;
    Ok(body)
}

pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(body).map_err(|e| ProtocolError::malformed(&e))
}

/// Read one frame body. A clean EOF before the prefix is `ConnectionClosed`.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut prefix = [0u8; 4];
    if let Err(e) = reader.read_exact(&mut prefix).await {
        return Err(match e.kind() {
            std::io::ErrorKind::UnexpectedEof => ProtocolError::ConnectionClosed,
            _ => ProtocolError::Io(e),
        });
    }

    let size = u32::from_be_bytes(prefix) as usize;
    check_size(size)?;

    let mut body = vec![0u8; size];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

/// Write one frame and flush.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    body: &[u8],
) -> Result<(), ProtocolError> {
    check_size(body.len())?;
    writer.write_all(&(body.len() as u32).to_be_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

/// Encode and write `msg` as one frame within `timeout`.
pub async fn send<W, T>(writer: &mut W, msg: &T, timeout: Duration) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = encode(msg)?;
    within(timeout, write_message(writer, &body)).await
}

/// Read and decode one frame within `timeout`.
pub async fn recv<R, T>(reader: &mut R, timeout: Duration) -> Result<T, ProtocolError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let body = within(timeout, read_message(reader)).await?;
    decode(&body)
}

pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    recv(reader, timeout).await
}

pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    send(writer, response, timeout).await
}
