//! Server-sent-event decoder for the completion stream.
//!
//! Bytes arrive in arbitrary chunks that are not aligned to lines. The
//! decoder keeps the unterminated tail between chunks and only interprets
//! complete lines, so the decoded deltas do not depend on where the network
//! split the body.
//!
//! Lines are split on raw `\n` bytes before UTF-8 decoding. A line feed never
//! occurs inside a multi-byte UTF-8 sequence, so characters split across
//! chunks are reassembled before they are decoded.

use futures::{Stream, StreamExt};
use serde_json::Value;
use tracing::{debug, trace, warn};

use super::StreamEvent;
use crate::error::{GenieError, Result};

/// Prefix of a data line.
const DATA_PREFIX: &str = "data: ";

/// End-of-stream sentinel payload.
const DONE_SENTINEL: &str = "[DONE]";

/// Outcome of a single complete line.
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Skip,
    Delta(String),
    Done,
}

/// Incremental, IO-free decoder.
///
/// Feed it chunks in arrival order; it returns the events completed by each
/// chunk. After the sentinel it is finished and ignores further input.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    finished: bool,
}

impl SseDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the stream has terminated.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Append a chunk and decode every line it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buf[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let outcome = {
                let line = String::from_utf8_lossy(&self.buf[start..end]);
                decode_line(&line)
            };
            start = end + 1;

            match outcome {
                Ok(Line::Delta(text)) => events.push(StreamEvent::Delta(text)),
                Ok(Line::Done) => {
                    self.finished = true;
                    self.buf.clear();
                    events.push(StreamEvent::Done);
                    return events;
                }
                Ok(Line::Skip) => {}
                Err(e) if e.is_recoverable() => debug!(error = %e, "Skipping malformed frame"),
                Err(e) => warn!(error = %e, "Skipping undecodable line"),
            }
        }

        self.buf.drain(..start);
        events
    }

    /// Signal that the underlying body closed.
    ///
    /// An unterminated trailing line is discarded.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        if !self.buf.is_empty() {
            trace!(pending_bytes = self.buf.len(), "Discarding unterminated line at stream close");
            self.buf.clear();
        }
        self.finished = true;
        vec![StreamEvent::Done]
    }
}

/// Interpret one complete line (without its `\n`).
fn decode_line(line: &str) -> Result<Line> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim().is_empty() || line.starts_with(':') {
        return Ok(Line::Skip);
    }
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Ok(Line::Skip);
    };

    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return Ok(Line::Done);
    }

    let v: Value = serde_json::from_str(payload).map_err(|e| GenieError::MalformedFrame {
        line: payload.to_string(),
        reason: e.to_string(),
    })?;

    match v.pointer("/choices/0/delta/content").and_then(Value::as_str) {
        Some(text) if !text.is_empty() => Ok(Line::Delta(text.to_string())),
        _ => Ok(Line::Skip),
    }
}

/// Decode a stream of byte chunks into [`StreamEvent`]s.
///
/// The returned stream yields every delta in order and ends with exactly one
/// [`StreamEvent::Done`]. Chunk errors are forwarded and end the stream.
pub fn decode_stream<S, B>(bytes: S) -> impl Stream<Item = Result<StreamEvent>> + Send
where
    S: Stream<Item = Result<B>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    async_stream::try_stream! {
        let mut decoder = SseDecoder::new();

        futures::pin_mut!(bytes);
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk?;
            let events = decoder.feed(chunk.as_ref());
            for event in events {
                yield event;
            }
            if decoder.is_finished() {
                break;
            }
        }

        let tail = decoder.finish();
        for event in tail {
            yield event;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(content: &str) -> String {
        format!(
            "data: {}\n",
            serde_json::json!({ "choices": [{ "delta": { "content": content } }] })
        )
    }

    fn hello_world() -> String {
        format!("{}{}data: [DONE]\n", frame("Hello "), frame("world"))
    }

    fn deltas(events: &[StreamEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Delta(t) => Some(t.as_str()),
                StreamEvent::Done => None,
            })
            .collect()
    }

    #[test]
    fn test_hello_world_accumulates_and_stops() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(hello_world().as_bytes());
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("Hello ".to_string()),
                StreamEvent::Delta("world".to_string()),
                StreamEvent::Done,
            ]
        );
        assert!(decoder.is_finished());
    }

    #[test]
    fn test_ignores_comments_blank_and_foreign_lines() {
        let body = format!(": keep-alive\n\nevent: ping\nid: 7\ndata:{{}}\n{}", frame("ok"));
        let mut decoder = SseDecoder::new();
        assert_eq!(deltas(&decoder.feed(body.as_bytes())), "ok");
    }

    #[test]
    fn test_malformed_frame_is_skipped() {
        let body = format!("data: {{\"choices\":[{{\"delta\":\n{}", frame("after"));
        let mut decoder = SseDecoder::new();
        assert_eq!(deltas(&decoder.feed(body.as_bytes())), "after");
        assert!(!decoder.is_finished());
    }

    #[test]
    fn test_crlf_lines() {
        let body = hello_world().replace('\n', "\r\n");
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(body.as_bytes());
        assert_eq!(deltas(&events), "Hello world");
        assert_eq!(events.last(), Some(&StreamEvent::Done));
    }

    #[test]
    fn test_empty_and_missing_content_are_skipped() {
        let body = format!(
            "{}data: {{\"choices\":[{{\"delta\":{{\"role\":\"assistant\"}}}}]}}\ndata: {{\"choices\":[]}}\n{}",
            frame(""),
            frame("x")
        );
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed(body.as_bytes()), vec![StreamEvent::Delta("x".to_string())]);
    }

    #[test]
    fn test_sentinel_discards_rest_of_buffer() {
        let body = format!("{}data: [DONE]\n{}", frame("a"), frame("b"));
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(body.as_bytes());
        assert_eq!(deltas(&events), "a");
        assert!(decoder.feed(frame("c").as_bytes()).is_empty());
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_every_two_way_split_yields_same_deltas() {
        let body = format!("{}{}data: [DONE]\n", frame("Grüße, "), frame("🚀 launch"));
        let bytes = body.as_bytes();

        for split in 0..=bytes.len() {
            let mut decoder = SseDecoder::new();
            let mut events = decoder.feed(&bytes[..split]);
            events.extend(decoder.feed(&bytes[split..]));
            assert_eq!(deltas(&events), "Grüße, 🚀 launch", "split at {split}");
            assert_eq!(events.last(), Some(&StreamEvent::Done), "split at {split}");
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let body = hello_world();
        let mut decoder = SseDecoder::new();
        let mut events = Vec::new();
        for b in body.as_bytes() {
            events.extend(decoder.feed(std::slice::from_ref(b)));
        }
        assert_eq!(deltas(&events), "Hello world");
    }

    #[test]
    fn test_finish_discards_partial_line() {
        let body = format!("{}data: {{\"choices\"", frame("kept"));
        let mut decoder = SseDecoder::new();
        let mut events = decoder.feed(body.as_bytes());
        events.extend(decoder.finish());
        assert_eq!(
            events,
            vec![StreamEvent::Delta("kept".to_string()), StreamEvent::Done]
        );
    }

    #[tokio::test]
    async fn test_decode_stream_without_sentinel_ends_with_done() {
        let chunks: Vec<Result<Vec<u8>>> = vec![
            Ok(frame("one ").into_bytes()),
            Ok(frame("two").into_bytes()),
        ];
        let events: Vec<_> = decode_stream(futures::stream::iter(chunks)).collect().await;
        let events: Vec<StreamEvent> = events.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(deltas(&events), "one two");
        assert_eq!(events.last(), Some(&StreamEvent::Done));
    }

    #[tokio::test]
    async fn test_decode_stream_stops_at_sentinel() {
        let chunks: Vec<Result<Vec<u8>>> = vec![
            Ok(hello_world().into_bytes()),
            Ok(frame("ignored").into_bytes()),
        ];
        let events: Vec<_> = decode_stream(futures::stream::iter(chunks)).collect().await;
        assert_eq!(events.len(), 3);
        assert!(matches!(events[2], Ok(StreamEvent::Done)));
    }

    #[tokio::test]
    async fn test_decode_stream_forwards_chunk_errors() {
        let chunks: Vec<Result<Vec<u8>>> = vec![
            Ok(frame("partial").into_bytes()),
            Err(GenieError::request_failed("connection reset")),
        ];
        let events: Vec<_> = decode_stream(futures::stream::iter(chunks)).collect().await;
        assert!(matches!(&events[0], Ok(StreamEvent::Delta(t)) if t == "partial"));
        assert!(matches!(&events[1], Err(GenieError::RequestFailed(_))));
        assert_eq!(events.len(), 2);
    }
}
