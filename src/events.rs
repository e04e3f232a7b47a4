//! Events streamed to the browser while an assistant message is generated.
//!
//! Each [`UiEvent::MessageUpdate`] carries the whole message so far, both as
//! raw text (kept by the page for the next turn's history) and as rendered
//! HTML (swapped into the message bubble).
//!
//! # Example
//!
//! ```rust
//! use cardinal_genie::events::{UiEvent, sse_event};
//!
//! let event = UiEvent::MessageUpdate {
//!     text: "Hello".to_string(),
//!     html: "<p>Hello</p>".to_string(),
//! };
//! let sse = sse_event(&event);
//! assert!(sse.starts_with("event: message.update\n"));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Notice;
use crate::render::MessageView;

/// Assistant text shown in place of a message whose request failed.
pub const APOLOGY: &str = "I apologize, but I encountered an error. Please try again.";

/// Events emitted on `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum UiEvent {
    /// A new assistant message has started.
    #[serde(rename = "stream.start")]
    StreamStart {
        /// Unique identifier for this request.
        request_id: String,
    },

    /// Full current assistant message.
    #[serde(rename = "message.update")]
    MessageUpdate { text: String, html: String },

    /// Request-level failure shown once as a transient notice.
    #[serde(rename = "notice")]
    Notice { title: String, description: String },

    /// End of the stream.
    #[serde(rename = "done")]
    Done,
}

impl UiEvent {
    /// Update carrying `text` and its assistant rendering.
    pub fn message_update(text: String) -> Self {
        let html = MessageView::assistant(text.as_str()).render();
        Self::MessageUpdate { text, html }
    }

    /// Update replacing the in-progress message with [`APOLOGY`].
    pub fn apology() -> Self {
        Self::message_update(APOLOGY.to_string())
    }
}

impl From<Notice> for UiEvent {
    fn from(notice: Notice) -> Self {
        Self::Notice {
            title: notice.title,
            description: notice.description,
        }
    }
}

/// Format a [`UiEvent`] as one SSE frame.
pub fn sse_event(evt: &UiEvent) -> String {
    let json = serde_json::to_string(evt).unwrap_or_else(|e| {
        serde_json::json!({
            "type": "notice",
            "data": { "title": "Error", "description": e.to_string() }
        })
        .to_string()
    });

    let event_name = event_name(evt);

    format!("event: {event_name}\ndata: {json}\n\n")
}

/// SSE event name for a [`UiEvent`].
pub fn event_name(evt: &UiEvent) -> &'static str {
    match evt {
        UiEvent::StreamStart { .. } => "stream.start",
        UiEvent::MessageUpdate { .. } => "message.update",
        UiEvent::Notice { .. } => "notice",
        UiEvent::Done => "done",
    }
}
