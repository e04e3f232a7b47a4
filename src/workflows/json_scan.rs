//! Locate a JSON value embedded in free-form model output.
//!
//! Models wrap JSON in prose or code fences. One pass over the text tracks
//! brackets and string literals, recording every balanced value of the
//! requested shape. The outermost of those are tried in order and the first
//! that deserializes wins.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{GenieError, Result};

/// Outermost shape to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Object,
    Array,
}

impl JsonShape {
    fn opener(self) -> u8 {
        match self {
            Self::Object => b'{',
            Self::Array => b'[',
        }
    }
}

/// First balanced `shape` in `text` that deserializes into `T`.
///
/// `what` names the result in the failure message, e.g. `"business plan"`.
pub fn first_json<T: DeserializeOwned>(text: &str, shape: JsonShape, what: &str) -> Result<T> {
    for (start, end) in outermost_spans(text.as_bytes(), shape.opener()) {
        match serde_json::from_str::<T>(&text[start..=end]) {
            Ok(value) => return Ok(value),
            Err(e) => debug!(start, end, error = %e, "Skipping JSON candidate"),
        }
    }

    Err(GenieError::ParseFailure(format!("Could not parse {what}")))
}

/// Inclusive spans of balanced values opened by `opener`, with spans nested
/// inside another recorded span dropped. Returned in start order.
///
/// String state is only tracked inside brackets, so stray quotes in prose do
/// not hide what follows. A mismatched closer abandons every open bracket.
fn outermost_spans(bytes: &[u8], opener: u8) -> Vec<(usize, usize)> {
    let mut stack: Vec<(u8, usize)> = Vec::new();
    let mut closed: Vec<(usize, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' if !stack.is_empty() => in_string = true,
            b'{' => stack.push((b'}', i)),
            b'[' => stack.push((b']', i)),
            b'}' | b']' => match stack.pop() {
                Some((closer, start)) if closer == b => {
                    if bytes[start] == opener {
                        closed.push((start, i));
                    }
                }
                Some(_) => stack.clear(),
                None => {}
            },
            _ => {}
        }
    }

    // Spans nest or are disjoint, so after sorting by start any span that
    // begins before the previous kept span ends lies inside it.
    closed.sort_unstable();
    let mut spans: Vec<(usize, usize)> = Vec::new();
    for (start, end) in closed {
        if spans.last().is_none_or(|&(_, last_end)| start > last_end) {
            spans.push((start, end));
        }
    }
    spans
}
