//! Promotional ad banners and their targeting settings.

use serde::{Deserialize, Serialize};

use super::content::{require_text, Collection, Document, Visibility};
use crate::errors::AppError;

/// Kind of promotion. Only ad banners take part in ad targeting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PromotionKind {
    #[default]
    AdBanner,
    Popup,
}

/// How a promotion chooses the pages it appears on.
///
/// Modes written by other tools and not known here deserialize to
/// `Unknown` and are never eligible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    All,
    Specific,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DisplaySettings {
    #[serde(default)]
    pub mode: DisplayMode,
    #[serde(default)]
    pub included_blogs: Vec<String>,
    #[serde(default)]
    pub included_news: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct PromotionImages {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Promotion {
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: PromotionKind,
    #[serde(default)]
    pub images: PromotionImages,
    pub redirect_url: String,
    #[serde(default = "default_cta")]
    pub cta_text: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub display_settings: DisplaySettings,
}

fn default_cta() -> String {
    "Claim bonus".to_string()
}

impl Document for Promotion {
    const COLLECTION: Collection = Collection::Promotions;

    fn slug(&self) -> Option<&str> {
        None
    }

    fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn validate(&mut self) -> Result<(), AppError> {
        require_text(&self.title, "Title")?;
        require_text(&self.redirect_url, "Redirect URL")?;
        if self.display_settings.mode == DisplayMode::Unknown {
            return Err(AppError::Validation(
                "displaySettings.mode must be 'all' or 'specific'".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_mode_deserializes_to_unknown() {
        let settings: DisplaySettings =
            serde_json::from_str(r#"{"mode":"geo","includedBlogs":["b1"]}"#).unwrap();
        assert_eq!(settings.mode, DisplayMode::Unknown);
    }

    #[test]
    fn test_unknown_mode_rejected_on_write() {
        let mut promo: Promotion = serde_json::from_str(
            r#"{"title":"Welcome bonus","redirectUrl":"https://example.com","displaySettings":{"mode":"geo"}}"#,
        )
        .unwrap();
        assert!(promo.validate().is_err());

        promo.display_settings.mode = DisplayMode::Specific;
        assert!(promo.validate().is_ok());
        assert_eq!(promo.kind, PromotionKind::AdBanner);
        assert_eq!(promo.cta_text, "Claim bonus");
    }
}
