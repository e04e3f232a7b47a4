//! Metric tiles.

use std::fmt::Write as _;

use super::escaped;
use crate::markup::MetricEntry;

/// Direction shown for a metric's change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Positive,
    Negative,
}

impl Trend {
    /// Positive only when the change text starts with `+`.
    pub fn from_change(change: &str) -> Self {
        if change.starts_with('+') {
            Self::Positive
        } else {
            Self::Negative
        }
    }

    fn class(self) -> &'static str {
        match self {
            Self::Positive => "metric-change metric-positive",
            Self::Negative => "metric-change metric-negative",
        }
    }
}

/// Render entries as a tile grid. Empty input renders nothing.
pub fn render_metrics(entries: &[MetricEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut out = String::from(r#"<div class="metric-grid">"#);
    for entry in entries {
        let _ = write!(
            out,
            r#"<div class="metric-tile"><p class="metric-value">{}</p><p class="metric-label">{}</p>"#,
            escaped(&entry.value),
            escaped(&entry.label)
        );
        if let Some(change) = entry.change.as_deref().filter(|c| !c.is_empty()) {
            let _ = write!(
                out,
                r#"<p class="{}">{}</p>"#,
                Trend::from_change(change).class(),
                escaped(change)
            );
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
    out
}
