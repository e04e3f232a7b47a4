//! Incremental text accumulator.
//!
//! Every delta is appended to one growing buffer and the whole buffer is
//! republished, so the renderer always sees the complete-so-far message.
//! Re-rendering the full buffer per delta costs O(n) per update and O(n²)
//! over a message, which is why the buffer is bounded.

use futures::{Stream, StreamExt};
use tracing::warn;

use super::StreamEvent;
use crate::error::Result;

/// Growing assistant message for one in-flight request.
#[derive(Debug)]
pub struct Accumulator {
    text: String,
    max_bytes: usize,
    truncated: bool,
}

impl Accumulator {
    /// Create an accumulator that stops growing at `max_bytes`.
    pub fn new(max_bytes: usize) -> Self {
        Self {
            text: String::new(),
            max_bytes,
            truncated: false,
        }
    }

    /// Append a delta and return the full current text.
    ///
    /// Returns `None` once the bound has been reached; the delta that
    /// crosses the bound is cut at a character boundary.
    pub fn push(&mut self, delta: &str) -> Option<&str> {
        if self.truncated {
            return None;
        }

        let room = self.max_bytes.saturating_sub(self.text.len());
        if delta.len() <= room {
            self.text.push_str(delta);
            return Some(&self.text);
        }

        let mut cut = room;
        while !delta.is_char_boundary(cut) {
            cut -= 1;
        }
        self.truncated = true;
        if cut == 0 {
            return None;
        }
        self.text.push_str(&delta[..cut]);
        Some(&self.text)
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the bound was hit.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Consume the accumulator, returning the text.
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Turn decoded events into a stream of full-text snapshots.
///
/// One snapshot is published per delta, in arrival order. The stream ends
/// at [`StreamEvent::Done`], on the first error, or when the message bound
/// is reached.
pub fn accumulate<S>(events: S, max_bytes: usize) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = Result<StreamEvent>> + Send + 'static,
{
    async_stream::try_stream! {
        let mut acc = Accumulator::new(max_bytes);

        futures::pin_mut!(events);
        while let Some(event) = events.next().await {
            let delta = match event? {
                StreamEvent::Delta(delta) => delta,
                StreamEvent::Done => break,
            };

            let snapshot = acc.push(&delta).map(ToString::to_string);
            if let Some(snapshot) = snapshot {
                yield snapshot;
            }
            if acc.is_truncated() {
                warn!(max_bytes, "Assistant message reached its length bound; stopping stream");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenieError;

    #[test]
    fn test_push_republishes_full_text() {
        let mut acc = Accumulator::new(1024);
        assert_eq!(acc.push("Hello "), Some("Hello "));
        assert_eq!(acc.push("world"), Some("Hello world"));
        assert_eq!(acc.into_text(), "Hello world");
    }

    #[test]
    fn test_push_truncates_on_char_boundary() {
        let mut acc = Accumulator::new(5);
        assert_eq!(acc.push("abc"), Some("abc"));
        // "é" is two bytes; only "d" fits before the bound at 5.
        assert_eq!(acc.push("déf"), Some("abcd"));
        assert!(acc.is_truncated());
        assert_eq!(acc.push("more"), None);
        assert_eq!(acc.text(), "abcd");
    }

    #[tokio::test]
    async fn test_accumulate_snapshots_in_order() {
        let events: Vec<Result<StreamEvent>> = vec![
            Ok(StreamEvent::Delta("Hello ".to_string())),
            Ok(StreamEvent::Delta("world".to_string())),
            Ok(StreamEvent::Done),
            Ok(StreamEvent::Delta("late".to_string())),
        ];
        let snapshots: Vec<String> = accumulate(futures::stream::iter(events), 1024)
            .map(|s| s.unwrap())
            .collect()
            .await;
        assert_eq!(snapshots, vec!["Hello ".to_string(), "Hello world".to_string()]);
    }

    #[tokio::test]
    async fn test_accumulate_stops_on_error() {
        let events: Vec<Result<StreamEvent>> = vec![
            Ok(StreamEvent::Delta("partial".to_string())),
            Err(GenieError::request_failed("read timed out")),
            Ok(StreamEvent::Delta("never".to_string())),
        ];
        let items: Vec<_> = accumulate(futures::stream::iter(events), 1024).collect().await;
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0], Ok(s) if s == "partial"));
        assert!(matches!(&items[1], Err(GenieError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn test_accumulate_stops_at_bound() {
        let events: Vec<Result<StreamEvent>> = vec![
            Ok(StreamEvent::Delta("12345".to_string())),
            Ok(StreamEvent::Delta("67890".to_string())),
            Ok(StreamEvent::Delta("abc".to_string())),
        ];
        let snapshots: Vec<String> = accumulate(futures::stream::iter(events), 8)
            .map(|s| s.unwrap())
            .collect()
            .await;
        assert_eq!(snapshots, vec!["12345".to_string(), "12345678".to_string()]);
    }
}
