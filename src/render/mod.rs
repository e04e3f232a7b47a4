//! HTML rendering of chat messages.
//!
//! Only assistant-authored text is interpreted as markup. The distinction is
//! carried by [`MessageView`]: a [`MessageView::UserText`] can only ever be
//! rendered as escaped plain text.
//!
//! # Structure
//!
//! - [`prose`]: markdown to HTML element mapping
//! - [`chart`]: chart blocks to inline SVG
//! - [`metrics`]: metric entries to tiles

pub mod chart;
pub mod metrics;
pub mod prose;

use std::fmt::Write as _;

use crate::genie::{ChatMessage, ChatRole};
use crate::markup::extract;

/// A message ready to be rendered, tagged by who wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageView {
    /// Typed by the user; rendered verbatim.
    UserText(String),
    /// Generated by the model; prose, charts and metrics are interpreted.
    AssistantText(String),
}

impl MessageView {
    /// Wrap user-authored text.
    pub fn user(text: impl Into<String>) -> Self {
        Self::UserText(text.into())
    }

    /// Wrap assistant-authored text.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::AssistantText(text.into())
    }

    /// Render to an HTML fragment.
    pub fn render(&self) -> String {
        match self {
            Self::UserText(text) => {
                let mut out = String::from(r#"<p class="text-sm leading-relaxed whitespace-pre-wrap">"#);
                escape_html(&mut out, text);
                out.push_str("</p>");
                out
            }
            Self::AssistantText(text) => render_assistant(text),
        }
    }
}

impl From<&ChatMessage> for MessageView {
    fn from(msg: &ChatMessage) -> Self {
        match msg.role {
            ChatRole::User => Self::UserText(msg.content.clone()),
            ChatRole::Assistant => Self::AssistantText(msg.content.clone()),
        }
    }
}

/// Prose first, then charts, then metric tiles.
fn render_assistant(text: &str) -> String {
    let extraction = extract(text);

    let mut out = String::from(r#"<div class="message-content">"#);
    out.push_str(&prose::render_prose(&extraction.prose));
    if extraction.has_blocks() {
        for block in &extraction.charts {
            if let Some(svg) = chart::render_chart(block) {
                out.push_str(&svg);
            }
        }
        out.push_str(&metrics::render_metrics(&extraction.metrics));
    }
    out.push_str("</div>");
    out
}

/// Append `text` to `out` with HTML special characters escaped.
///
/// Safe for element content and double- or single-quoted attribute values.
pub fn escape_html(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}

/// Escaped copy of `text`.
pub fn escaped(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_html(&mut out, text);
    out
}

/// A small notice fragment shown for request-level failures and confirmations.
pub fn render_notice(title: &str, description: &str, destructive: bool) -> String {
    let variant = if destructive { "notice notice-destructive" } else { "notice" };
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<div class="{variant}" role="status"><p class="notice-title">{}</p><p class="notice-description">{}</p></div>"#,
        escaped(title),
        escaped(description)
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_text_is_never_interpreted() {
        let text = "**bold** <script>alert(1)</script>\n```metrics\n[{\"label\":\"X\",\"value\":\"1\"}]\n```";
        let html = MessageView::user(text).render();
        assert!(html.contains("**bold**"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("```metrics"));
        assert!(!html.contains("<strong"));
        assert!(!html.contains("metric-tile"));
    }

    #[test]
    fn test_assistant_text_renders_blocks_after_prose() {
        let text = "## Plan\n\n```chart:bar Revenue\n[{\"name\":\"Y1\",\"revenue\":10}]\n```\n\n```metrics\n[{\"label\":\"ROI\",\"value\":\"150%\",\"change\":\"+25%\"}]\n```";
        let html = MessageView::assistant(text).render();
        let heading = html.find("<h2").unwrap();
        let chart = html.find("<svg").unwrap();
        let tile = html.find("metric-tile").unwrap();
        assert!(heading < chart && chart < tile);
        assert!(!html.contains("```"));
    }

    #[test]
    fn test_view_from_message_keeps_role() {
        let view = MessageView::from(&ChatMessage::user("hi"));
        assert_eq!(view, MessageView::UserText("hi".to_string()));
        let view = MessageView::from(&ChatMessage::assistant("hello"));
        assert_eq!(view, MessageView::AssistantText("hello".to_string()));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escaped(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn test_notice_escapes() {
        let html = render_notice("Connection Error", "<boom>", true);
        assert!(html.contains("notice-destructive"));
        assert!(html.contains("&lt;boom&gt;"));
    }
}
