//! Business plan generator.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::json_scan::{JsonShape, first_json};
use super::{PromptForm, lenient_text, require, slugify};
use crate::error::Result;
use crate::genie::{GenieBackend, collect_text};
use crate::render::{MessageView, escaped};

/// Industry choices as `(value, label)`.
pub const INDUSTRIES: [(&str, &str); 9] = [
    ("technology", "Technology"),
    ("healthcare", "Healthcare"),
    ("finance", "Finance & Fintech"),
    ("ecommerce", "E-Commerce & Retail"),
    ("food", "Food & Beverage"),
    ("realestate", "Real Estate"),
    ("education", "Education"),
    ("consulting", "Consulting"),
    ("other", "Other"),
];

/// Business model choices as `(value, label)`.
pub const MODELS: [(&str, &str); 7] = [
    ("b2b", "B2B (Business to Business)"),
    ("b2c", "B2C (Business to Consumer)"),
    ("saas", "SaaS (Software as a Service)"),
    ("marketplace", "Marketplace"),
    ("subscription", "Subscription"),
    ("agency", "Agency/Service"),
    ("hybrid", "Hybrid"),
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusinessPlanForm {
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub business_model: String,
    #[serde(default)]
    pub target_market: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub funding: String,
}

impl PromptForm for BusinessPlanForm {
    fn validate(&self) -> Result<()> {
        require("business_name", &self.business_name)?;
        require("industry", &self.industry)?;
        require("business_model", &self.business_model)
    }

    fn prompt(&self) -> String {
        format!(
            r#"Generate a comprehensive business plan for:
Business Name: {}
Industry: {}
Business Model: {}
Target Market: {}
Description: {}
Funding Goal: {}

Provide a detailed business plan with these sections in JSON format:
{{
  "executiveSummary": "...",
  "companyDescription": "...",
  "marketAnalysis": "...",
  "organization": "...",
  "productService": "...",
  "marketing": "...",
  "financials": "...",
  "appendix": "..."
}}

Make each section detailed and professional. Return ONLY valid JSON."#,
            self.business_name.trim(),
            self.industry.trim(),
            self.business_model.trim(),
            self.target_market.trim(),
            self.description.trim(),
            self.funding.trim(),
        )
    }
}

/// The eight plan sections as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessPlan {
    #[serde(deserialize_with = "lenient_text")]
    pub executive_summary: String,
    #[serde(deserialize_with = "lenient_text")]
    pub company_description: String,
    #[serde(deserialize_with = "lenient_text")]
    pub market_analysis: String,
    #[serde(deserialize_with = "lenient_text")]
    pub organization: String,
    #[serde(deserialize_with = "lenient_text")]
    pub product_service: String,
    #[serde(deserialize_with = "lenient_text")]
    pub marketing: String,
    #[serde(deserialize_with = "lenient_text")]
    pub financials: String,
    #[serde(deserialize_with = "lenient_text")]
    pub appendix: String,
}

/// One plan section with its on-screen and download headings.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    pub title: &'static str,
    pub heading: &'static str,
    pub body: &'a str,
}

impl BusinessPlan {
    /// Sections in plan order.
    pub fn sections(&self) -> [Section<'_>; 8] {
        [
            Section { title: "Executive Summary", heading: "EXECUTIVE SUMMARY", body: &self.executive_summary },
            Section { title: "Company Description", heading: "COMPANY DESCRIPTION", body: &self.company_description },
            Section { title: "Market Analysis", heading: "MARKET ANALYSIS", body: &self.market_analysis },
            Section { title: "Organization", heading: "ORGANIZATION & MANAGEMENT", body: &self.organization },
            Section { title: "Product/Service", heading: "PRODUCTS & SERVICES", body: &self.product_service },
            Section { title: "Marketing Strategy", heading: "MARKETING STRATEGY", body: &self.marketing },
            Section { title: "Financial Projections", heading: "FINANCIAL PROJECTIONS", body: &self.financials },
            Section { title: "Appendix", heading: "APPENDIX", body: &self.appendix },
        ]
    }

    /// Plain-text export.
    pub fn to_text(&self, business_name: &str) -> String {
        let mut out = format!(
            "BUSINESS PLAN: {}\n{}\n",
            business_name.trim().to_uppercase(),
            "=".repeat(50)
        );
        for section in self.sections() {
            let _ = write!(out, "\n{}\n{}\n{}\n", section.heading, "-".repeat(30), section.body);
        }
        out
    }

    /// Each section as a titled card with its body rendered as assistant content.
    pub fn render(&self) -> String {
        let mut out = String::from(r#"<div class="plan-sections">"#);
        for (i, section) in self.sections().iter().enumerate() {
            let _ = write!(
                out,
                r#"<section class="plan-section"><h3 class="plan-section-title"><span class="plan-section-index">{}</span>{}</h3>{}</section>"#,
                i + 1,
                escaped(section.title),
                MessageView::assistant(section.body).render()
            );
        }
        out.push_str("</div>");
        out
    }
}

/// Generated plan plus the name it was generated for.
#[derive(Debug, Clone)]
pub struct GeneratedPlan {
    pub business_name: String,
    pub plan: BusinessPlan,
}

impl GeneratedPlan {
    /// `<slug>-business-plan.txt`
    pub fn download_name(&self) -> String {
        format!("{}-business-plan.txt", slugify(&self.business_name))
    }

    pub fn download_text(&self) -> String {
        self.plan.to_text(&self.business_name)
    }
}

/// Validate, prompt, collect, and pull the plan object out of the output.
pub async fn generate(
    backend: &dyn GenieBackend,
    form: &BusinessPlanForm,
    max_bytes: usize,
) -> Result<GeneratedPlan> {
    form.validate()?;
    info!(
        name: "workflow.business_plan.start",
        business = %form.business_name.trim(),
        industry = %form.industry.trim(),
        "Generating business plan"
    );
    let text = collect_text(backend, form.prompt(), max_bytes).await?;
    let plan = first_json(&text, JsonShape::Object, "business plan")?;
    Ok(GeneratedPlan {
        business_name: form.business_name.trim().to_string(),
        plan,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenieError;

    const PLAN_OUTPUT: &str = r#"Here is your plan:
```json
{
  "executiveSummary": "Acme builds **rockets**.",
  "companyDescription": "Founded 2024.",
  "marketAnalysis": "TAM $10B.\n\n```chart:pie Market Share\n[{\"name\":\"Acme\",\"value\":1},{\"name\":\"Others\",\"value\":3}]\n```",
  "organization": "Two founders.",
  "productService": ["Launch", "Recovery"],
  "marketing": "Direct sales.",
  "financials": "```metrics\n[{\"label\":\"ROI\",\"value\":\"150%\",\"change\":\"+25%\"}]\n```",
  "appendix": ""
}
```"#;

    fn plan() -> BusinessPlan {
        first_json(PLAN_OUTPUT, JsonShape::Object, "business plan").unwrap()
    }

    #[test]
    fn test_required_fields() {
        let form = BusinessPlanForm {
            business_name: "Acme".to_string(),
            industry: "technology".to_string(),
            ..BusinessPlanForm::default()
        };
        assert!(matches!(form.validate(), Err(GenieError::MissingField("business_model"))));
    }

    #[test]
    fn test_prompt_asks_for_json() {
        let form = BusinessPlanForm {
            business_name: "Acme".to_string(),
            industry: "technology".to_string(),
            business_model: "saas".to_string(),
            ..BusinessPlanForm::default()
        };
        let prompt = form.prompt();
        assert!(prompt.contains("Business Model: saas"));
        assert!(prompt.contains("\"executiveSummary\": \"...\""));
        assert!(prompt.ends_with("Return ONLY valid JSON."));
    }

    #[test]
    fn test_plan_parses_from_fenced_output() {
        let plan = plan();
        assert_eq!(plan.organization, "Two founders.");
        assert_eq!(plan.product_service, "- Launch\n- Recovery");
    }

    #[test]
    fn test_sections_render_in_order_with_blocks() {
        let html = plan().render();
        assert_eq!(html.matches(r#"<section class="plan-section">"#).count(), 8);
        let first = html.find("Executive Summary").unwrap();
        let last = html.find("Appendix").unwrap();
        assert!(first < last);
        assert!(html.contains("Acme: 25%"));
        assert!(html.contains("metric-positive"));
    }

    #[test]
    fn test_text_export() {
        let generated = GeneratedPlan {
            business_name: "Acme Rocket".to_string(),
            plan: plan(),
        };
        let text = generated.download_text();
        assert!(text.starts_with("BUSINESS PLAN: ACME ROCKET\n=================================================="));
        assert!(text.contains("\nORGANIZATION & MANAGEMENT\n------------------------------\nTwo founders.\n"));
        assert_eq!(generated.download_name(), "acme-rocket-business-plan.txt");
    }

    #[test]
    fn test_missing_json_is_parse_failure() {
        let err = first_json::<BusinessPlan>("Sorry, I cannot help.", JsonShape::Object, "business plan")
            .unwrap_err();
        assert_eq!(err.to_string(), "Could not parse business plan");
    }
}
