//! HTTP client for the hosted genie functions.
//!
//! This module implements [`GenieBackend`] over reqwest: a streamed
//! `POST {base}/functions/v1/chat` and a one-shot
//! `POST {base}/functions/v1/generate-logo`.

use std::time::Duration;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use super::{ChatMessage, EventStream, GenieBackend, LogoImage, LogoRequest, decode_stream};
use crate::config::BackendConfig;
use crate::error::{GenieError, Result};

/// Path of the streaming chat function.
const CHAT_PATH: &str = "functions/v1/chat";

/// Path of the logo generation function.
const LOGO_PATH: &str = "functions/v1/generate-logo";

/// Connection settings for the hosted functions.
#[derive(Clone)]
pub struct GenieSettings {
    /// Base URL of the functions host.
    pub base_url: Url,
    /// Bearer token sent with every call.
    pub api_key: String,
    /// Upper bound on waiting for the response head or any body chunk.
    pub read_timeout: Duration,
    /// Upper bound on establishing a connection.
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for GenieSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenieSettings")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("read_timeout", &self.read_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl GenieSettings {
    /// Build settings from the backend configuration section.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| GenieError::InvalidField {
            field: "backend.base_url",
            reason: e.to_string(),
        })?;
        Ok(Self {
            base_url,
            api_key: config.api_key.clone(),
            read_timeout: Duration::from_secs(config.read_timeout_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.as_str().trim_end_matches('/'))
    }
}

/// Request body for the chat function.
#[derive(Debug, Serialize)]
struct ChatBody {
    messages: Vec<ChatMessage>,
}

/// Response body of the logo function.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogoBody {
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Error payload the functions return on non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// reqwest-backed [`GenieBackend`].
#[derive(Clone)]
pub struct HttpGenieClient {
    http: reqwest::Client,
    settings: GenieSettings,
}

impl std::fmt::Debug for HttpGenieClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGenieClient")
            .field("settings", &self.settings)
            .finish()
    }
}

impl HttpGenieClient {
    /// Create a client with the given settings.
    pub fn new(settings: GenieSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| GenieError::request_failed(format!("HTTP client setup failed: {e}")))?;
        Ok(Self { http, settings })
    }

    /// Settings this client was built with.
    pub fn settings(&self) -> &GenieSettings {
        &self.settings
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let rb = self.http.post(self.settings.endpoint(path));
        if self.settings.api_key.is_empty() {
            rb
        } else {
            rb.bearer_auth(&self.settings.api_key)
        }
    }

    /// Send a request, bounded by the read timeout, and require a success status.
    async fn send(&self, rb: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let resp = tokio::time::timeout(self.settings.read_timeout, rb.send())
            .await
            .map_err(|_elapsed| GenieError::request_failed(format!("{what} timed out")))?
            .map_err(|e| GenieError::request_failed(format!("{what} failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        // The error body is read under the same bound as the success path.
        let text = match tokio::time::timeout(self.settings.read_timeout, resp.text()).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                debug!(error = %e, "Error body was unreadable");
                String::new()
            }
            Err(_elapsed) => {
                debug!(status = %status, "Timed out reading the error body");
                String::new()
            }
        };
        let detail = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or_else(|_| format!("{what} failed with status {status}"));
        warn!(status = %status, detail = %detail, "Upstream returned an error status");
        Err(GenieError::RequestFailed(detail))
    }
}

/// Bound every chunk read by `timeout`, mapping transport failures to
/// [`GenieError::RequestFailed`].
fn with_read_timeout<S, B>(
    body: S,
    timeout: Duration,
) -> impl Stream<Item = Result<B>> + Send + 'static
where
    S: Stream<Item = reqwest::Result<B>> + Send + 'static,
    B: Send + 'static,
{
    async_stream::try_stream! {
        futures::pin_mut!(body);
        loop {
            let next = tokio::time::timeout(timeout, body.next())
                .await
                .map_err(|_elapsed| GenieError::request_failed("Reading the response timed out"))?;
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk
                .map_err(|e| GenieError::request_failed(format!("Reading the response failed: {e}")))?;
            yield chunk;
        }
    }
}

#[async_trait::async_trait]
impl GenieBackend for HttpGenieClient {
    async fn stream_chat(&self, messages: Vec<ChatMessage>) -> Result<EventStream> {
        info!(
            name: "genie.chat.request",
            message_count = messages.len(),
            "Calling chat function"
        );

        let rb = self.post(CHAT_PATH).json(&ChatBody { messages });
        let resp = self.send(rb, "Chat request").await?;
        debug!(status = %resp.status(), "Chat stream opened");

        let bytes = with_read_timeout(resp.bytes_stream(), self.settings.read_timeout);
        Ok(Box::pin(decode_stream(bytes)))
    }

    async fn generate_logo(&self, request: &LogoRequest) -> Result<LogoImage> {
        info!(
            name: "genie.logo.request",
            business_name = %request.business_name,
            style = %request.style,
            "Calling logo function"
        );

        let rb = self.post(LOGO_PATH).json(request);
        let resp = self.send(rb, "Logo request").await?;

        let body = tokio::time::timeout(self.settings.read_timeout, resp.json::<LogoBody>())
            .await
            .map_err(|_elapsed| GenieError::request_failed("Logo request timed out"))?
            .map_err(|e| GenieError::request_failed(format!("Logo response was unreadable: {e}")))?;

        match (body.image_url, body.error) {
            (Some(image_url), _) if !image_url.is_empty() => Ok(LogoImage { image_url }),
            (_, Some(error)) => Err(GenieError::RequestFailed(error)),
            _ => Err(GenieError::request_failed("No image was returned.")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base: &str) -> GenieSettings {
        GenieSettings::from_config(&BackendConfig {
            base_url: base.to_string(),
            api_key: "secret".to_string(),
            read_timeout_secs: 5,
            connect_timeout_secs: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(
            settings("https://genie.example.co/").endpoint(CHAT_PATH),
            "https://genie.example.co/functions/v1/chat"
        );
        assert_eq!(
            settings("http://127.0.0.1:54321").endpoint(LOGO_PATH),
            "http://127.0.0.1:54321/functions/v1/generate-logo"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = GenieSettings::from_config(&BackendConfig {
            base_url: "not a url".to_string(),
            api_key: String::new(),
            read_timeout_secs: 5,
            connect_timeout_secs: 1,
        })
        .unwrap_err();
        assert!(matches!(err, GenieError::InvalidField { field: "backend.base_url", .. }));
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", settings("https://genie.example.co"));
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret"));
    }
}
