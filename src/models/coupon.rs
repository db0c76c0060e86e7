//! Coupon model.

use serde::{Deserialize, Serialize};

use super::content::{normalize_slug, require_text, Collection, Document, Seo, Visibility};
use crate::errors::AppError;

/// A bonus or promo code, optionally tied to a reviewed site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Coupon {
    pub slug: String,
    pub title: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
    /// Weak reference to a site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    pub redirect_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub seo: Seo,
}

impl Document for Coupon {
    const COLLECTION: Collection = Collection::Coupons;

    fn slug(&self) -> Option<&str> {
        Some(&self.slug)
    }

    fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn validate(&mut self) -> Result<(), AppError> {
        self.slug = normalize_slug(&self.slug)?;
        require_text(&self.title, "Title")?;
        require_text(&self.code, "Code")?;
        require_text(&self.redirect_url, "Redirect URL")?;
        if let Some(expires_at) = &self.expires_at {
            chrono::DateTime::parse_from_rfc3339(expires_at).map_err(|_| {
                AppError::Validation("expiresAt must be an RFC 3339 timestamp".to_string())
            })?;
        }
        Ok(())
    }
}
