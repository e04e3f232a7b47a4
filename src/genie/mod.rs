//! Client side of the hosted completion service.
//!
//! This module turns a chat request into a stream of content deltas and
//! a growing message buffer.
//!
//! # Overview
//!
//! The [`GenieBackend`] trait is the seam between the HTTP surface and the
//! hosted service. [`HttpGenieClient`] implements it over reqwest; tests
//! implement it with scripted byte streams.
//!
//! # Pipeline
//!
//! - [`decoder`]: server-sent-event bytes to [`StreamEvent`]s
//! - [`accumulator`]: deltas to full-text snapshots
//!
//! # Example
//!
//! ```rust,ignore
//! use cardinal_genie::genie::{ChatMessage, GenieBackend, accumulate};
//!
//! let events = backend.stream_chat(vec![ChatMessage::user("Form an LLC")]).await?;
//! let snapshots = accumulate(events, 256 * 1024);
//! ```

pub mod accumulator;
pub mod client;
pub mod decoder;

pub use accumulator::{Accumulator, accumulate};
pub use client::{GenieSettings, HttpGenieClient};
pub use decoder::{SseDecoder, decode_stream};

use std::pin::Pin;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{GenieError, Result};

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Message typed by the user.
    User,
    /// Message generated by the model.
    Assistant,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author of the message.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Create a user-authored message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant-authored message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Decoded unit of the completion stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental fragment of assistant text.
    Delta(String),
    /// End of stream, either the `[DONE]` sentinel or the body closing.
    Done,
}

/// Boxed stream of decoded events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Parameters for the one-shot logo generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoRequest {
    /// Business name to draw.
    pub business_name: String,
    /// Industry hint.
    pub industry: String,
    /// Visual style keyword.
    pub style: String,
    /// Preferred palette, free text.
    pub colors: String,
}

/// A generated logo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoImage {
    /// Renderable image URL or data URI.
    pub image_url: String,
}

/// Access to the hosted completion and image services.
#[async_trait::async_trait]
pub trait GenieBackend: Send + Sync {
    /// Start a streamed chat completion for the given history.
    ///
    /// # Errors
    ///
    /// Returns [`GenieError::RequestFailed`] if the response is not successful.
    /// Errors that happen while the body is read arrive as stream items.
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<EventStream>;

    /// Generate a logo in a single non-streaming request.
    async fn generate_logo(&self, request: &LogoRequest) -> Result<LogoImage>;
}

/// Run a single-prompt completion to the end and return the full text.
///
/// Used by the form workflows, which only act on the final output, so no
/// intermediate snapshots are built.
pub async fn collect_text(
    backend: &dyn GenieBackend,
    prompt: String,
    max_bytes: usize,
) -> Result<String> {
    let mut events = backend.stream_chat(vec![ChatMessage::user(prompt)]).await?;
    let mut acc = Accumulator::new(max_bytes);

    while let Some(event) = events.next().await {
        let StreamEvent::Delta(delta) = event? else {
            break;
        };
        acc.push(&delta);
        if acc.is_truncated() {
            warn!(
                max_bytes,
                collected = acc.text().len(),
                "Completion reached its length bound; using the text so far"
            );
            break;
        }
    }

    let text = acc.into_text();
    if text.trim().is_empty() {
        return Err(GenieError::request_failed("The model returned an empty response."));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialization() {
        let msg = ChatMessage::user("Hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"Hello"}"#);
    }

    #[test]
    fn test_logo_request_is_camel_case() {
        let req = LogoRequest {
            business_name: "Acme".to_string(),
            industry: "Tools".to_string(),
            style: "modern".to_string(),
            colors: "Red".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["businessName"], "Acme");
        assert_eq!(json["colors"], "Red");
    }

    /// Backend answering every chat call with the same deltas.
    struct Canned(Vec<&'static str>);

    #[async_trait::async_trait]
    impl GenieBackend for Canned {
        async fn stream_chat(&self, _messages: Vec<ChatMessage>) -> Result<EventStream> {
            let events: Vec<Result<StreamEvent>> = self
                .0
                .iter()
                .map(|d| Ok(StreamEvent::Delta((*d).to_string())))
                .chain(std::iter::once(Ok(StreamEvent::Done)))
                .collect();
            Ok(Box::pin(futures::stream::iter(events)))
        }

        async fn generate_logo(&self, _request: &LogoRequest) -> Result<LogoImage> {
            Err(GenieError::request_failed("not scripted"))
        }
    }

    #[tokio::test]
    async fn test_collect_text_joins_deltas() {
        let text = collect_text(&Canned(vec!["# Plan", "\nStep one"]), "p".to_string(), 1024)
            .await
            .unwrap();
        assert_eq!(text, "# Plan\nStep one");
    }

    #[tokio::test]
    async fn test_collect_text_stops_at_bound() {
        let text = collect_text(&Canned(vec!["12345", "67890", "abc"]), "p".to_string(), 8)
            .await
            .unwrap();
        assert_eq!(text, "12345678");
    }

    #[tokio::test]
    async fn test_collect_text_blank_is_request_failure() {
        let err = collect_text(&Canned(vec!["  ", "\n"]), "p".to_string(), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, GenieError::RequestFailed(_)));
    }
}
