//! Error taxonomy for the genie pipeline.
//!
//! Decode-level errors ([`GenieError::MalformedFrame`], [`GenieError::MalformedBlock`])
//! are recovered where they occur and only ever logged. Request-level errors
//! surface to the user once, as a [`Notice`].

use serde::Serialize;
use thiserror::Error;

/// Errors produced by the streaming pipeline and the form workflows.
#[derive(Error, Debug)]
pub enum GenieError {
    /// The hosted endpoint answered with a non-success status, no usable body,
    /// a transport error, or the body read timed out.
    #[error("{0}")]
    RequestFailed(String),

    /// A `data:` line whose payload is not valid JSON.
    #[error("malformed frame ({reason}): {line}")]
    MalformedFrame {
        /// The offending payload, after the `data: ` prefix.
        line: String,
        /// Parser message.
        reason: String,
    },

    /// A chart or metrics fence whose body is not valid JSON or not the expected shape.
    #[error("malformed {kind} block: {reason}")]
    MalformedBlock {
        /// `chart` or `metrics`.
        kind: &'static str,
        /// Parser message.
        reason: String,
    },

    /// A workflow could not locate its JSON result in the model output.
    #[error("{0}")]
    ParseFailure(String),

    /// A required form field was left blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A form field carries a value outside its allowed set.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type alias for genie operations.
pub type Result<T> = std::result::Result<T, GenieError>;

/// A transient, user-visible failure notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Short headline.
    pub title: String,
    /// One-sentence description.
    pub description: String,
}

impl Notice {
    /// Build a notice from any title/description pair.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

impl GenieError {
    /// Shorthand for [`GenieError::RequestFailed`].
    pub fn request_failed(reason: impl Into<String>) -> Self {
        Self::RequestFailed(reason.into())
    }

    /// Whether this error is recovered inside the pipeline and must not reach the user.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedFrame { .. } | Self::MalformedBlock { .. })
    }

    /// Map the error to the notice shown to the user.
    pub fn notice(&self) -> Notice {
        match self {
            Self::RequestFailed(reason) => Notice::new("Connection Error", reason.clone()),
            Self::ParseFailure(reason) => Notice::new("Generation Failed", reason.clone()),
            Self::MissingField(_) => Notice::new(
                "Missing Information",
                "Please complete all required fields.",
            ),
            Self::InvalidField { field, reason } => {
                Notice::new("Invalid Information", format!("{field}: {reason}"))
            }
            Self::MalformedFrame { .. } | Self::MalformedBlock { .. } => {
                Notice::new("Generation Failed", "Please try again.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_notice() {
        let err = GenieError::request_failed("Rate limit exceeded. Please try again in a moment.");
        let notice = err.notice();
        assert_eq!(notice.title, "Connection Error");
        assert!(notice.description.contains("Rate limit"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_decode_errors_are_recoverable() {
        let frame = GenieError::MalformedFrame {
            line: "{".to_string(),
            reason: "EOF".to_string(),
        };
        let block = GenieError::MalformedBlock {
            kind: "chart",
            reason: "trailing comma".to_string(),
        };
        assert!(frame.is_recoverable());
        assert!(block.is_recoverable());
    }

    #[test]
    fn test_missing_field_notice() {
        let notice = GenieError::MissingField("company_name").notice();
        assert_eq!(notice.title, "Missing Information");
    }
}
