//! Server-rendered pages.
//!
//! Pages are plain HTML strings. Behavior lives in `/static/app.js`, which
//! streams chat turns and submits workflow forms; styling lives in
//! `/static/app.css`.
//!
//! # Structure
//!
//! - [`pages`]: chat page, services overview and the four workflow pages

pub mod pages;

use std::fmt::Write as _;

use crate::render::escaped;

/// Navigation entries as `(path, label)`.
pub const NAV: [(&str, &str); 6] = [
    ("/", "AI Chat"),
    ("/services", "Services"),
    ("/brand-generator", "Brand Generator"),
    ("/business-plan", "Business Plan"),
    ("/llc-formation", "LLC Formation"),
    ("/pitch-deck", "Pitch Deck"),
];

/// Wrap page content in the document shell.
pub fn html_shell(title: &str, active: &str, content: &str) -> String {
    let mut nav = String::new();
    for (path, label) in NAV {
        let class = if path == active { "nav-link nav-active" } else { "nav-link" };
        let _ = write!(nav, r#"<a href="{path}" class="{class}">{label}</a>"#);
    }
    let title = escaped(title);

    format!(r#"<!DOCTYPE html>
<html lang="en" class="dark">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="AI partner for business formation, planning and branding">
    <title>{title} - Cardinal Business Genie</title>
    <link rel="stylesheet" href="/static/app.css">
    <script defer src="/static/app.js"></script>
</head>
<body>
    <div id="app-shell">
        <header class="site-header">
            <div class="container header-row">
                <a href="/" class="brand">
                    <span class="brand-mark">C</span>
                    <span class="brand-name">Cardinal Business Genie</span>
                </a>
                <nav class="site-nav">{nav}</nav>
            </div>
        </header>

        <main id="app" class="container">
            {content}
        </main>

        <div id="notices" class="notice-stack" aria-live="polite"></div>
    </div>
</body>
</html>"#)
}

/// `<option>` list with `selected` preselected and a disabled placeholder.
pub fn select_options(placeholder: &str, options: &[(&str, &str)], selected: &str) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<option value="" disabled{}>{}</option>"#,
        if selected.is_empty() { " selected" } else { "" },
        escaped(placeholder)
    );
    for (value, label) in options {
        let _ = write!(
            out,
            r#"<option value="{}"{}>{}</option>"#,
            escaped(value),
            if *value == selected { " selected" } else { "" },
            escaped(label)
        );
    }
    out
}

/// Page header with title and subtitle.
pub fn page_header(title: &str, subtitle: &str) -> String {
    format!(
        r#"<div class="page-header"><h1 class="page-title">{}</h1><p class="page-subtitle">{}</p></div>"#,
        escaped(title),
        escaped(subtitle)
    )
}

/// Result block with a text download button.
pub fn download_block(file_name: &str, text: &str) -> String {
    format!(
        r#"<div class="download"><textarea class="download-text" hidden>{}</textarea><button type="button" class="btn btn-outline" data-download="{}">Download</button></div>"#,
        escaped(text),
        escaped(file_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_marks_active_nav() {
        let html = html_shell("Pitch Deck", "/pitch-deck", "<p>x</p>");
        assert!(html.contains(r#"<a href="/pitch-deck" class="nav-link nav-active">Pitch Deck</a>"#));
        assert!(html.contains(r#"<a href="/" class="nav-link">AI Chat</a>"#));
        assert!(html.contains("<title>Pitch Deck - Cardinal Business Genie</title>"));
    }

    #[test]
    fn test_select_options() {
        let html = select_options("Pick", &[("a", "A & co"), ("b", "B")], "b");
        assert!(html.starts_with(r#"<option value="" disabled>Pick</option>"#));
        assert!(html.contains(r#"<option value="a">A &amp; co</option>"#));
        assert!(html.contains(r#"<option value="b" selected>B</option>"#));
    }

    #[test]
    fn test_download_block_escapes_text() {
        let html = download_block("plan.txt", "</textarea><script>");
        assert!(html.contains("&lt;/textarea&gt;&lt;script&gt;"));
        assert!(html.contains(r#"data-download="plan.txt""#));
    }
}
