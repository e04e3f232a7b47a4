//! Cardinal Business Genie
//!
//! A streaming business assistant: chat turns and form workflows are sent to
//! a hosted completion service, the server-sent-event response is decoded and
//! accumulated, and the growing assistant text is rendered to HTML with
//! embedded charts and metric tiles.
//!
//! # Architecture
//!
//! - **Server**: Axum HTTP server; chat responses stream to the browser as SSE
//! - **Genie client**: SSE decoder, accumulator and the hosted-service seam
//! - **Rendering**: markdown prose, SVG charts and metric tiles
//!
//! # Modules
//!
//! - [`genie`]: decoding, accumulation and the [`genie::GenieBackend`] trait
//! - [`markup`]: chart and metrics block extraction
//! - [`render`]: HTML rendering behind the user/assistant trust boundary
//! - [`workflows`]: LLC, business plan, pitch deck and brand forms
//! - [`events`]: events streamed to the page

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod config;
pub mod error;
pub mod events;
pub mod genie;
pub mod markup;
pub mod render;
pub mod server;
pub mod ui;
pub mod workflows;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::genie::GenieBackend;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Hosted completion and image services.
    pub backend: Arc<dyn GenieBackend>,
    /// Global configuration.
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish()
    }
}
