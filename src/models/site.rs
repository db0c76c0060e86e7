//! Betting-site review model.

use serde::{Deserialize, Serialize};

use super::content::{normalize_slug, require_text, Collection, Document, Seo, Visibility};
use crate::errors::AppError;

/// A reviewed betting site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Site {
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    /// Review score between 0 and 5
    #[serde(default)]
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus: Option<String>,
    pub affiliate_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Review body (HTML)
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub seo: Seo,
}

impl Document for Site {
    const COLLECTION: Collection = Collection::Sites;

    fn slug(&self) -> Option<&str> {
        Some(&self.slug)
    }

    fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn rating(&self) -> Option<f64> {
        Some(self.rating)
    }

    fn image(&self) -> Option<&str> {
        self.logo.as_deref()
    }

    fn validate(&mut self) -> Result<(), AppError> {
        self.slug = normalize_slug(&self.slug)?;
        require_text(&self.name, "Name")?;
        require_text(&self.affiliate_url, "Affiliate URL")?;
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(AppError::Validation(
                "Rating must be between 0 and 5".to_string(),
            ));
        }
        Ok(())
    }
}
