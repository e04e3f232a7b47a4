//! Form workflows.
//!
//! Each workflow validates a submitted form, turns it into one prompt, runs
//! the prompt through the completion pipeline and shapes the final text into
//! its result.
//!
//! - [`llc`]: LLC formation package (markdown document)
//! - [`business_plan`]: eight-section plan (JSON object in the output)
//! - [`pitch_deck`]: slide list (JSON array in the output)
//! - [`brand`]: logo image (one-shot image call, no prompt)

pub mod brand;
pub mod business_plan;
pub mod json_scan;
pub mod llc;
pub mod pitch_deck;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{GenieError, Result};

/// A form that becomes a single completion prompt.
pub trait PromptForm {
    /// Check required fields and allowed values.
    fn validate(&self) -> Result<()>;

    /// Build the prompt. Only meaningful after [`PromptForm::validate`] passed.
    fn prompt(&self) -> String;
}

/// Fail with [`GenieError::MissingField`] when `value` is blank.
pub(crate) fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(GenieError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Lower-cased name with whitespace runs replaced by `-`, for download file names.
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Accept model output fields that should be text but sometimes are not.
/// Lists become markdown bullet lists; other values keep their JSON form.
pub(crate) fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(&Value::deserialize(deserializer)?))
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(|item| format!("- {}", value_to_text(item)))
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}
