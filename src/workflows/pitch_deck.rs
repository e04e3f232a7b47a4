//! Investor pitch deck generator.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::json_scan::{JsonShape, first_json};
use super::{PromptForm, lenient_text, require, slugify};
use crate::error::{GenieError, Result};
use crate::genie::{GenieBackend, collect_text};
use crate::render::{MessageView, escaped};

pub const INDUSTRIES: [(&str, &str); 9] = [
    ("saas", "SaaS / Software"),
    ("fintech", "Fintech"),
    ("healthtech", "Healthtech"),
    ("ecommerce", "E-Commerce"),
    ("marketplace", "Marketplace"),
    ("ai", "AI / ML"),
    ("consumer", "Consumer"),
    ("b2b", "B2B Services"),
    ("other", "Other"),
];

pub const STAGES: [(&str, &str); 5] = [
    ("pre-seed", "Pre-Seed"),
    ("seed", "Seed"),
    ("series-a", "Series A"),
    ("series-b", "Series B"),
    ("growth", "Growth"),
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PitchDeckForm {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub problem_statement: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub funding_goal: String,
    #[serde(default)]
    pub stage: String,
}

impl PromptForm for PitchDeckForm {
    fn validate(&self) -> Result<()> {
        require("company_name", &self.company_name)?;
        require("problem_statement", &self.problem_statement)?;
        require("solution", &self.solution)
    }

    fn prompt(&self) -> String {
        format!(
            r#"Generate a professional investor pitch deck for:
Company: {}
Industry: {}
Problem: {}
Solution: {}
Funding Goal: {}
Stage: {}

Return a JSON array with exactly 8 slides:
[
  {{"title": "Problem", "content": "Rich markdown content with data, stats, bullet points..."}},
  {{"title": "Solution", "content": "Rich markdown with features, benefits..."}},
  {{"title": "Market Opportunity", "content": "Market size, TAM/SAM/SOM with actual numbers..."}},
  {{"title": "Business Model", "content": "Revenue streams, pricing, unit economics..."}},
  {{"title": "Traction", "content": "Metrics, growth, milestones with charts..."}},
  {{"title": "Team", "content": "Team strengths, experience..."}},
  {{"title": "Financials", "content": "Projections with chart data..."}},
  {{"title": "The Ask", "content": "Funding amount, use of funds, timeline..."}}
]

Make each slide content RICH with:
- Use ```chart:bar or ```chart:line for data visualization
- Use ```metrics for key stats
- Use markdown tables where appropriate
- Use bold, headers, bullet points

Return ONLY valid JSON array."#,
            self.company_name.trim(),
            self.industry.trim(),
            self.problem_statement.trim(),
            self.solution.trim(),
            self.funding_goal.trim(),
            self.stage.trim(),
        )
    }
}

/// One slide; `content` is markdown with optional chart and metrics fences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    #[serde(deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(deserialize_with = "lenient_text")]
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct PitchDeck {
    pub company_name: String,
    pub slides: Vec<Slide>,
}

impl PitchDeck {
    /// `<slug>-pitch-deck.txt`
    pub fn download_name(&self) -> String {
        format!("{}-pitch-deck.txt", slugify(&self.company_name))
    }

    /// Plain-text export, one block per slide.
    pub fn download_text(&self) -> String {
        self.slides
            .iter()
            .enumerate()
            .map(|(i, slide)| {
                format!(
                    "\nSLIDE {}: {}\n{}\n\n{}\n\n",
                    i + 1,
                    slide.title.to_uppercase(),
                    "=".repeat(50),
                    slide.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Slides as numbered panels; content is rendered as assistant text.
    pub fn render(&self) -> String {
        let total = self.slides.len();
        let mut out = String::from(r#"<div class="deck">"#);
        for (i, slide) in self.slides.iter().enumerate() {
            let _ = write!(
                out,
                r#"<section class="slide" data-slide="{i}"><header class="slide-header"><span class="slide-number">{} / {total}</span><h3 class="slide-title">{}</h3></header>{}</section>"#,
                i + 1,
                escaped(&slide.title),
                MessageView::assistant(slide.content.as_str()).render()
            );
        }
        out.push_str("</div>");
        out
    }
}

/// Validate, prompt, collect, and pull the slide array out of the output.
pub async fn generate(
    backend: &dyn GenieBackend,
    form: &PitchDeckForm,
    max_bytes: usize,
) -> Result<PitchDeck> {
    form.validate()?;
    info!(
        name: "workflow.pitch_deck.start",
        company = %form.company_name.trim(),
        stage = %form.stage.trim(),
        "Generating pitch deck"
    );
    let text = collect_text(backend, form.prompt(), max_bytes).await?;
    let slides: Vec<Slide> = first_json(&text, JsonShape::Array, "pitch deck")?;
    if slides.is_empty() {
        return Err(GenieError::ParseFailure("Could not parse pitch deck".to_string()));
    }
    Ok(PitchDeck {
        company_name: form.company_name.trim().to_string(),
        slides,
    })
}
