//! Markdown prose to HTML.
//!
//! Raw HTML in the source is escaped, never passed through. Links open in a
//! new browsing context without a referrer, and only web, mail, relative and
//! fragment targets become anchors.

use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use super::escape_html;

/// Render markdown `text` to an HTML fragment.
pub fn render_prose(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut writer = ProseWriter::default();
    for event in Parser::new_ext(text, options) {
        writer.event(event);
    }
    writer.out
}

#[derive(Default)]
struct ProseWriter {
    out: String,
    /// `true` for each open link that was emitted as an anchor.
    links: Vec<bool>,
    /// `true` for each open ordered list.
    lists: Vec<bool>,
    /// Nesting depth of images; text inside is alt text.
    image_depth: usize,
    alignments: Vec<Alignment>,
    cell_index: usize,
    in_table_head: bool,
}

impl ProseWriter {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => escape_html(&mut self.out, &text),
            Event::Code(code) => {
                self.out.push_str(r#"<code class="md-code-inline">"#);
                escape_html(&mut self.out, &code);
                self.out.push_str("</code>");
            }
            Event::Html(html) | Event::InlineHtml(html) => escape_html(&mut self.out, &html),
            Event::SoftBreak => self.out.push('\n'),
            Event::HardBreak => self.out.push_str("<br>"),
            Event::Rule => self.out.push_str(r#"<hr class="md-rule">"#),
            Event::TaskListMarker(checked) => {
                self.out.push_str(if checked { "\u{2611} " } else { "\u{2610} " });
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        if self.image_depth > 0 {
            if matches!(tag, Tag::Image { .. }) {
                self.image_depth += 1;
            }
            return;
        }

        match tag {
            Tag::Paragraph => self.out.push_str(r#"<p class="md-p">"#),
            Tag::Heading { level, .. } => {
                let (n, class) = heading(level);
                self.out.push_str(&format!(r#"<h{n} class="{class}">"#));
            }
            Tag::List(Some(start)) => {
                self.lists.push(true);
                if start == 1 {
                    self.out.push_str(r#"<ol class="md-ol">"#);
                } else {
                    self.out.push_str(&format!(r#"<ol class="md-ol" start="{start}">"#));
                }
            }
            Tag::List(None) => {
                self.lists.push(false);
                self.out.push_str(r#"<ul class="md-ul">"#);
            }
            Tag::Item => {
                if self.lists.last() == Some(&false) {
                    self.out.push_str(concat!(
                        r#"<li class="md-li"><span class="md-bullet" aria-hidden="true">"#,
                        "\u{2022}",
                        r#"</span><div class="md-li-body">"#
                    ));
                } else {
                    self.out.push_str(r#"<li class="md-li">"#);
                }
            }
            Tag::Emphasis => self.out.push_str(r#"<em class="md-em">"#),
            Tag::Strong => self.out.push_str(r#"<strong class="md-strong">"#),
            Tag::Strikethrough => self.out.push_str("<del>"),
            Tag::BlockQuote(_) => self.out.push_str(r#"<blockquote class="md-quote">"#),
            Tag::CodeBlock(kind) => {
                self.out.push_str(r#"<pre class="md-pre"><code"#);
                if let CodeBlockKind::Fenced(lang) = kind {
                    let lang = lang.split_whitespace().next().unwrap_or_default();
                    if !lang.is_empty() {
                        self.out.push_str(r#" class="language-"#);
                        escape_html(&mut self.out, lang);
                        self.out.push('"');
                    }
                }
                self.out.push('>');
            }
            Tag::Table(alignments) => {
                self.alignments = alignments;
                self.out
                    .push_str(r#"<div class="md-table-wrap"><table class="md-table">"#);
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.cell_index = 0;
                self.out.push_str(r#"<thead class="md-thead"><tr>"#);
            }
            Tag::TableRow => {
                self.cell_index = 0;
                self.out.push_str(r#"<tr class="md-tr">"#);
            }
            Tag::TableCell => {
                let cell = if self.in_table_head { "th" } else { "td" };
                self.out.push_str(&format!(r#"<{cell} class="md-{cell}""#));
                match self.alignments.get(self.cell_index) {
                    Some(Alignment::Left) => self.out.push_str(r#" style="text-align:left""#),
                    Some(Alignment::Center) => self.out.push_str(r#" style="text-align:center""#),
                    Some(Alignment::Right) => self.out.push_str(r#" style="text-align:right""#),
                    _ => {}
                }
                self.out.push('>');
            }
            Tag::Link { dest_url, title, .. } => {
                let safe = is_safe_href(&dest_url);
                if safe {
                    self.out.push_str(r#"<a class="md-link" href=""#);
                    escape_html(&mut self.out, &dest_url);
                    self.out.push('"');
                    if !title.is_empty() {
                        self.out.push_str(r#" title=""#);
                        escape_html(&mut self.out, &title);
                        self.out.push('"');
                    }
                    self.out
                        .push_str(r#" target="_blank" rel="noopener noreferrer">"#);
                } else {
                    self.out.push_str(r#"<span class="md-link-blocked">"#);
                }
                self.links.push(safe);
            }
            Tag::Image { .. } => self.image_depth = 1,
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        if self.image_depth > 0 {
            if matches!(tag, TagEnd::Image) {
                self.image_depth -= 1;
            }
            return;
        }

        match tag {
            TagEnd::Paragraph => self.out.push_str("</p>"),
            TagEnd::Heading(level) => {
                let (n, _) = heading(level);
                self.out.push_str(&format!("</h{n}>"));
            }
            TagEnd::List(ordered) => {
                self.lists.pop();
                self.out.push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => {
                if self.lists.last() == Some(&false) {
                    self.out.push_str("</div></li>");
                } else {
                    self.out.push_str("</li>");
                }
            }
            TagEnd::Emphasis => self.out.push_str("</em>"),
            TagEnd::Strong => self.out.push_str("</strong>"),
            TagEnd::Strikethrough => self.out.push_str("</del>"),
            TagEnd::BlockQuote(_) => self.out.push_str("</blockquote>"),
            TagEnd::CodeBlock => self.out.push_str("</code></pre>"),
            TagEnd::Table => {
                self.alignments.clear();
                self.out.push_str("</tbody></table></div>");
            }
            TagEnd::TableHead => {
                self.in_table_head = false;
                self.out.push_str("</tr></thead><tbody>");
            }
            TagEnd::TableRow => self.out.push_str("</tr>"),
            TagEnd::TableCell => {
                self.out
                    .push_str(if self.in_table_head { "</th>" } else { "</td>" });
                self.cell_index += 1;
            }
            TagEnd::Link => match self.links.pop() {
                Some(true) => self.out.push_str("</a>"),
                Some(false) => self.out.push_str("</span>"),
                None => {}
            },
            _ => {}
        }
    }
}

/// Heading tag number and class. Levels past four share the level-4 look.
fn heading(level: HeadingLevel) -> (u8, &'static str) {
    match level {
        HeadingLevel::H1 => (1, "md-h1"),
        HeadingLevel::H2 => (2, "md-h2"),
        HeadingLevel::H3 => (3, "md-h3"),
        HeadingLevel::H4 => (4, "md-h4"),
        HeadingLevel::H5 => (5, "md-h4"),
        HeadingLevel::H6 => (6, "md-h4"),
    }
}

/// Web, mail, relative and fragment links only.
fn is_safe_href(href: &str) -> bool {
    let href = href.trim();
    let scheme_end = href.find(|c| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(i) if href.as_bytes()[i] == b':' => {
            let scheme = href[..i].to_ascii_lowercase();
            matches!(scheme.as_str(), "http" | "https" | "mailto")
        }
        _ => true,
    }
}
