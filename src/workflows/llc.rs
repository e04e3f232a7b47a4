//! LLC formation wizard.

use serde::Deserialize;
use tracing::info;

use super::{PromptForm, require, slugify};
use crate::error::{GenieError, Result};
use crate::genie::{GenieBackend, collect_text};
use crate::render::MessageView;

/// Wizard steps as `(title, description)`.
pub const STEPS: [(&str, &str); 5] = [
    ("Company Name", "Choose your LLC name"),
    ("State Selection", "Where to register"),
    ("Business Details", "Type and ownership"),
    ("Registered Agent", "Legal representative"),
    ("Review & Generate", "Final review"),
];

/// States an LLC can be registered in.
pub const US_STATES: [&str; 50] = [
    "Alabama", "Alaska", "Arizona", "Arkansas", "California", "Colorado", "Connecticut",
    "Delaware", "Florida", "Georgia", "Hawaii", "Idaho", "Illinois", "Indiana", "Iowa",
    "Kansas", "Kentucky", "Louisiana", "Maine", "Maryland", "Massachusetts", "Michigan",
    "Minnesota", "Mississippi", "Missouri", "Montana", "Nebraska", "Nevada", "New Hampshire",
    "New Jersey", "New Mexico", "New York", "North Carolina", "North Dakota", "Ohio",
    "Oklahoma", "Oregon", "Pennsylvania", "Rhode Island", "South Carolina", "South Dakota",
    "Tennessee", "Texas", "Utah", "Vermont", "Virginia", "Washington", "West Virginia",
    "Wisconsin", "Wyoming",
];

/// Business type choices as `(value, label)`.
pub const BUSINESS_TYPES: [(&str, &str); 8] = [
    ("consulting", "Consulting & Professional Services"),
    ("ecommerce", "E-Commerce & Retail"),
    ("technology", "Technology & Software"),
    ("realestate", "Real Estate & Property"),
    ("healthcare", "Healthcare & Wellness"),
    ("creative", "Creative & Media"),
    ("food", "Food & Beverage"),
    ("other", "Other"),
];

/// Membership choices as `(value, label)`.
pub const OWNER_OPTIONS: [(&str, &str); 3] = [
    ("single", "Single Member (Just Me)"),
    ("two", "Two Members"),
    ("multiple", "Multiple Members (3+)"),
];

/// Submitted wizard fields. Only the name and state are required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LlcForm {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub business_type: String,
    #[serde(default)]
    pub owners: String,
    #[serde(default)]
    pub registered_agent: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub purpose: String,
}

impl PromptForm for LlcForm {
    fn validate(&self) -> Result<()> {
        require("company_name", &self.company_name)?;
        require("state", &self.state)?;
        if !US_STATES.contains(&self.state.trim()) {
            return Err(GenieError::InvalidField {
                field: "state",
                reason: format!("{} is not a U.S. state", self.state.trim()),
            });
        }
        Ok(())
    }

    fn prompt(&self) -> String {
        let name = self.company_name.trim();
        let state = self.state.trim();
        format!(
            "Generate LLC formation documents for:
Company Name: {name} LLC
State: {state}
Business Type: {}
Number of Owners/Members: {}
Registered Agent: {}
Business Address: {}
Business Purpose: {}

Generate a comprehensive LLC formation package including:
1. Articles of Organization template
2. Operating Agreement template
3. EIN Application guidance
4. State-specific filing requirements for {state}
5. Compliance checklist
6. Estimated costs and timelines

Format this as a professional document guide.",
            self.business_type.trim(),
            self.owners.trim(),
            self.registered_agent.trim(),
            self.address.trim(),
            self.purpose.trim(),
        )
    }
}

/// Generated formation package.
#[derive(Debug, Clone)]
pub struct LlcDocuments {
    pub company_name: String,
    /// Markdown document as produced by the model.
    pub text: String,
}

impl LlcDocuments {
    /// `<slug>-llc-formation.txt`
    pub fn download_name(&self) -> String {
        format!("{}-llc-formation.txt", slugify(&self.company_name))
    }

    /// The package rendered as assistant content.
    pub fn render(&self) -> String {
        MessageView::assistant(self.text.as_str()).render()
    }
}

/// Validate, prompt, and collect the full package.
pub async fn generate(
    backend: &dyn GenieBackend,
    form: &LlcForm,
    max_bytes: usize,
) -> Result<LlcDocuments> {
    form.validate()?;
    info!(
        name: "workflow.llc.start",
        company = %form.company_name.trim(),
        state = %form.state.trim(),
        "Generating LLC documents"
    );
    let text = collect_text(backend, form.prompt(), max_bytes).await?;
    Ok(LlcDocuments {
        company_name: form.company_name.trim().to_string(),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> LlcForm {
        LlcForm {
            company_name: "Acme Rocket".to_string(),
            state: "Delaware".to_string(),
            business_type: "technology".to_string(),
            owners: "two".to_string(),
            purpose: "Software development".to_string(),
            ..LlcForm::default()
        }
    }

    #[test]
    fn test_requires_name_and_state() {
        let f = LlcForm {
            company_name: " ".to_string(),
            ..form()
        };
        assert!(matches!(f.validate(), Err(GenieError::MissingField("company_name"))));

        let f = LlcForm {
            state: String::new(),
            ..form()
        };
        assert!(matches!(f.validate(), Err(GenieError::MissingField("state"))));
    }

    #[test]
    fn test_rejects_unknown_state() {
        let f = LlcForm {
            state: "Atlantis".to_string(),
            ..form()
        };
        assert!(matches!(f.validate(), Err(GenieError::InvalidField { field: "state", .. })));
    }

    #[test]
    fn test_prompt_appends_llc_and_lists_deliverables() {
        let f = form();
        assert!(f.validate().is_ok());
        let prompt = f.prompt();
        assert!(prompt.contains("Company Name: Acme Rocket LLC\n"));
        assert!(prompt.contains("4. State-specific filing requirements for Delaware"));
        assert!(prompt.contains("6. Estimated costs and timelines"));
        assert!(prompt.ends_with("Format this as a professional document guide."));
    }

    #[test]
    fn test_download_name() {
        let docs = LlcDocuments {
            company_name: "Acme Rocket".to_string(),
            text: String::new(),
        };
        assert_eq!(docs.download_name(), "acme-rocket-llc-formation.txt");
    }

    #[test]
    fn test_fifty_states() {
        assert_eq!(US_STATES.len(), 50);
        assert!(US_STATES.contains(&"New Hampshire"));
    }
}
