//! Logo generator.
//!
//! Unlike the text workflows this is one non-streaming image call.

use serde::Deserialize;
use tracing::info;

use super::{require, slugify};
use crate::error::{GenieError, Result};
use crate::genie::{GenieBackend, LogoImage, LogoRequest};
use crate::render::escaped;

/// Palette sent when the user leaves colors blank.
pub const DEFAULT_COLORS: &str = "professional color palette";

/// Visual style of the logo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogoStyle {
    #[default]
    Modern,
    Professional,
    Creative,
    Tech,
    Elegant,
    Playful,
}

impl LogoStyle {
    pub const ALL: [Self; 6] = [
        Self::Modern,
        Self::Professional,
        Self::Creative,
        Self::Tech,
        Self::Elegant,
        Self::Playful,
    ];

    /// Keyword sent to the image service.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Modern => "modern",
            Self::Professional => "professional",
            Self::Creative => "creative",
            Self::Tech => "tech",
            Self::Elegant => "elegant",
            Self::Playful => "playful",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Modern => "Modern & Minimalist",
            Self::Professional => "Professional & Corporate",
            Self::Creative => "Creative & Artistic",
            Self::Tech => "Tech & Futuristic",
            Self::Elegant => "Elegant & Luxury",
            Self::Playful => "Playful & Fun",
        }
    }

    /// Blank selects the default style.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(Self::default());
        }
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| GenieError::InvalidField {
                field: "style",
                reason: format!("unknown logo style {value}"),
            })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrandForm {
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub colors: String,
}

impl BrandForm {
    /// Validate and build the image request.
    pub fn to_request(&self) -> Result<LogoRequest> {
        require("business_name", &self.business_name)?;
        require("industry", &self.industry)?;
        let style = LogoStyle::parse(&self.style)?;
        let colors = match self.colors.trim() {
            "" => DEFAULT_COLORS,
            colors => colors,
        };
        Ok(LogoRequest {
            business_name: self.business_name.trim().to_string(),
            industry: self.industry.trim().to_string(),
            style: style.as_str().to_string(),
            colors: colors.to_string(),
        })
    }
}

/// A generated logo ready for display and download.
#[derive(Debug, Clone)]
pub struct BrandLogo {
    pub business_name: String,
    pub image: LogoImage,
}

impl BrandLogo {
    /// `<slug>-logo.png`
    pub fn download_name(&self) -> String {
        format!("{}-logo.png", slugify(&self.business_name))
    }

    pub fn render(&self) -> String {
        let url = escaped(&self.image.image_url);
        let name = escaped(&self.business_name);
        format!(
            r#"<div class="logo-result"><img class="logo-image" src="{url}" alt="{name} logo"><a class="btn btn-outline" href="{url}" download="{}">Download Logo</a></div>"#,
            escaped(&self.download_name())
        )
    }
}

/// Validate the form and request one logo.
pub async fn generate(backend: &dyn GenieBackend, form: &BrandForm) -> Result<BrandLogo> {
    let request = form.to_request()?;
    info!(
        name: "workflow.brand.start",
        business = %request.business_name,
        style = %request.style,
        "Generating logo"
    );
    let image = backend.generate_logo(&request).await?;
    if !is_displayable(&image.image_url) {
        return Err(GenieError::request_failed("The image service returned an unusable image URL."));
    }
    Ok(BrandLogo {
        business_name: request.business_name,
        image,
    })
}

/// Web URLs and inline images only.
fn is_displayable(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    ["https://", "http://", "data:image/"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> BrandForm {
        BrandForm {
            business_name: "Acme Rocket".to_string(),
            industry: "Aerospace".to_string(),
            ..BrandForm::default()
        }
    }

    #[test]
    fn test_defaults() {
        let req = form().to_request().unwrap();
        assert_eq!(req.style, "modern");
        assert_eq!(req.colors, DEFAULT_COLORS);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["businessName"], "Acme Rocket");
    }

    #[test]
    fn test_requires_name_and_industry() {
        let f = BrandForm {
            industry: String::new(),
            ..form()
        };
        assert!(matches!(f.to_request(), Err(GenieError::MissingField("industry"))));
    }

    #[test]
    fn test_style_parsing() {
        assert_eq!(LogoStyle::parse("Tech").unwrap(), LogoStyle::Tech);
        assert_eq!(LogoStyle::parse("").unwrap(), LogoStyle::Modern);
        assert!(matches!(
            LogoStyle::parse("brutalist"),
            Err(GenieError::InvalidField { field: "style", .. })
        ));
    }

    #[test]
    fn test_displayable_urls() {
        assert!(is_displayable("https://cdn.example.com/logo.png"));
        assert!(is_displayable("data:image/png;base64,AAAA"));
        assert!(!is_displayable("javascript:alert(1)"));
        assert!(!is_displayable("data:text/html,hi"));
    }

    #[test]
    fn test_render_offers_download() {
        let logo = BrandLogo {
            business_name: "Acme Rocket".to_string(),
            image: LogoImage {
                image_url: "data:image/png;base64,AAAA".to_string(),
            },
        };
        let html = logo.render();
        assert!(html.contains(r#"download="acme-rocket-logo.png""#));
        assert!(html.contains(r#"src="data:image/png;base64,AAAA""#));
    }
}
