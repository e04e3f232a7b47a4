//! Embedded chart and metrics blocks in assistant text.
//!
//! The model embeds data in two fenced forms:
//!
//! ````text
//! ```chart:bar Revenue Projections
//! [{"name":"Year 1","revenue":50000}]
//! ```
//!
//! ```metrics
//! [{"label":"ROI","value":"150%","change":"+25%"}]
//! ```
//! ````
//!
//! [`extract`] pulls both kinds out of a (possibly still streaming) buffer
//! and returns the remaining prose. It runs on every re-render, so it uses
//! the `regex` crate, whose matching is linear in the input length.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::GenieError;

/// `chart:<kind>`, optional same-line title, newline, lazy body, closing fence.
static CHART_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```chart:(bar|line|pie|area)[ \t]*([^\n]*?)[ \t]*\r?\n(.*?)```")
        .expect("chart fence pattern is valid")
});

/// `metrics`, newline, lazy body, closing fence.
static METRICS_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```metrics[ \t]*\r?\n(.*?)```").expect("metrics fence pattern is valid")
});

/// Chart flavours understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Area,
}

impl ChartKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "bar" => Some(Self::Bar),
            "line" => Some(Self::Line),
            "pie" => Some(Self::Pie),
            "area" => Some(Self::Area),
            _ => None,
        }
    }

    /// Lower-case name used in the fence and in CSS classes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
            Self::Area => "area",
        }
    }
}

/// A parsed chart fence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBlock {
    pub kind: ChartKind,
    pub title: Option<String>,
    /// One record per category; keys keep their document order.
    pub rows: Vec<Map<String, Value>>,
}

/// One tile of a metrics fence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub label: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub change: Option<String>,
}

/// Result of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    /// Text with every recognized fence removed, trimmed.
    pub prose: String,
    /// Chart blocks in document order.
    pub charts: Vec<ChartBlock>,
    /// Metric entries in document order, flattened across fences.
    pub metrics: Vec<MetricEntry>,
}

impl Extraction {
    /// Whether anything besides prose was found.
    pub fn has_blocks(&self) -> bool {
        !self.charts.is_empty() || !self.metrics.is_empty()
    }
}

/// Extract chart and metrics blocks from `text`.
///
/// Malformed blocks are dropped but still removed from the prose. Removing a
/// fence can splice neighbouring backticks into a new fence, so passes repeat
/// until none match; each pass strictly shortens the text. This keeps
/// `extract(&extract(t).prose)` block-free with unchanged prose.
pub fn extract(text: &str) -> Extraction {
    let mut out = Extraction::default();
    let mut current = text.to_string();

    loop {
        let mut matched = false;

        for caps in CHART_FENCE.captures_iter(&current) {
            matched = true;
            match parse_chart(&caps[1], &caps[2], &caps[3]) {
                Ok(chart) => out.charts.push(chart),
                Err(e) if e.is_recoverable() => debug!(error = %e, "Dropping chart block"),
                Err(e) => warn!(error = %e, "Dropping chart block"),
            }
        }
        let without_charts = CHART_FENCE.replace_all(&current, "").into_owned();

        for caps in METRICS_FENCE.captures_iter(&without_charts) {
            matched = true;
            match parse_metrics(&caps[1]) {
                Ok(entries) => out.metrics.extend(entries),
                Err(e) if e.is_recoverable() => debug!(error = %e, "Dropping metrics block"),
                Err(e) => warn!(error = %e, "Dropping metrics block"),
            }
        }
        let without_metrics = METRICS_FENCE.replace_all(&without_charts, "").into_owned();

        current = without_metrics;
        if !matched {
            break;
        }
    }

    out.prose = current.trim().to_string();
    out
}

fn parse_chart(tag: &str, title: &str, body: &str) -> Result<ChartBlock, GenieError> {
    let kind = ChartKind::from_tag(tag).ok_or_else(|| GenieError::MalformedBlock {
        kind: "chart",
        reason: format!("unknown chart type {tag}"),
    })?;
    let rows: Vec<Map<String, Value>> =
        serde_json::from_str(body.trim()).map_err(|e| GenieError::MalformedBlock {
            kind: "chart",
            reason: e.to_string(),
        })?;
    let title = title.trim();
    Ok(ChartBlock {
        kind,
        title: (!title.is_empty()).then(|| title.to_string()),
        rows,
    })
}

fn parse_metrics(body: &str) -> Result<Vec<MetricEntry>, GenieError> {
    serde_json::from_str(body.trim()).map_err(|e| GenieError::MalformedBlock {
        kind: "metrics",
        reason: e.to_string(),
    })
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}
