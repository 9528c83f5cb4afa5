// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded capture buffer for worker stdout/stderr.
//!
//! A long-lived, chatty worker must not grow supervisor memory without
//! bound. The buffer keeps the first quarter of its capacity forever (the
//! head, where startup errors land) and a ring of the most recent bytes
//! (the tail). Bytes evicted from the ring are counted, not stored.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Default capacity per stream (64 KiB).
pub const DEFAULT_OUTPUT_CAPACITY: usize = 64 * 1024;

struct BufferState {
    head: Vec<u8>,
    tail: VecDeque<u8>,
    head_cap: usize,
    tail_cap: usize,
    dropped: u64,
    total: u64,
}

/// Shared, bounded, append-only byte buffer.
///
/// Cloning is cheap and all clones see the same contents; the pump task
/// appends while readers take snapshots.
#[derive(Clone)]
pub struct OutputBuffer {
    inner: Arc<Mutex<BufferState>>,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_CAPACITY)
    }
}

impl std::fmt::Debug for OutputBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("OutputBuffer")
            .field("total", &state.total)
            .field("dropped", &state.dropped)
            .finish()
    }
}

impl OutputBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(4);
        let head_cap = capacity / 4;
        Self {
            inner: Arc::new(Mutex::new(BufferState {
                head: Vec::with_capacity(head_cap),
                tail: VecDeque::new(),
                head_cap,
                tail_cap: capacity - head_cap,
                dropped: 0,
                total: 0,
            })),
        }
    }

    pub fn append(&self, bytes: &[u8]) {
        let mut state = self.inner.lock();
        state.total += bytes.len() as u64;

        let room = state.head_cap - state.head.len();
        let (to_head, rest) = bytes.split_at(room.min(bytes.len()));
        state.head.extend_from_slice(to_head);

        state.tail.extend(rest.iter().copied());
        let overflow = state.tail.len().saturating_sub(state.tail_cap);
        if overflow > 0 {
            state.tail.drain(..overflow);
            state.dropped += overflow as u64;
        }
    }

    /// Bytes ever appended, including dropped ones.
    pub fn total_bytes(&self) -> u64 {
        self.inner.lock().total
    }

    /// Bytes evicted from the middle of the stream.
    pub fn dropped_bytes(&self) -> u64 {
        self.inner.lock().dropped
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().total == 0
    }

    /// Retained text. A marker notes any gap between head and tail.
    pub fn contents(&self) -> String {
        let state = self.inner.lock();
        let head = String::from_utf8_lossy(&state.head);
        let tail: Vec<u8> = state.tail.iter().copied().collect();
        let tail = String::from_utf8_lossy(&tail);
        if state.dropped == 0 {
            format!("{head}{tail}")
        } else {
            format!("{head}\n[... {} bytes dropped ...]\n{tail}", state.dropped)
        }
    }

    /// First `max_chars` characters of the stream.
    pub fn head(&self, max_chars: usize) -> String {
        let state = self.inner.lock();
        let text = if state.dropped == 0 {
            let mut bytes = state.head.clone();
            bytes.extend(state.tail.iter().copied());
            String::from_utf8_lossy(&bytes).into_owned()
        } else {
            String::from_utf8_lossy(&state.head).into_owned()
        };
        head_chars(&text, max_chars).to_string()
    }

    /// Last `max_chars` characters of the stream.
    pub fn tail(&self, max_chars: usize) -> String {
        let state = self.inner.lock();
        let mut bytes = Vec::with_capacity(state.head.len() + state.tail.len());
        if state.dropped == 0 {
            bytes.extend_from_slice(&state.head);
        }
        bytes.extend(state.tail.iter().copied());
        let text = String::from_utf8_lossy(&bytes);
        tail_chars(&text, max_chars).to_string()
    }
}

/// Leading `max_chars` characters of `s`, on a char boundary.
pub fn head_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Trailing `max_chars` characters of `s`, on a char boundary.
pub fn tail_chars(s: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match s.char_indices().rev().nth(max_chars - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
