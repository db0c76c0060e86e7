//! Casino games and their categories.

use serde::{Deserialize, Serialize};

use super::content::{normalize_slug, require_text, Collection, Document, Seo, Visibility};
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Game {
    pub slug: String,
    pub title: String,
    /// Weak reference to a game category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub seo: Seo,
}

impl Document for Game {
    const COLLECTION: Collection = Collection::Games;

    fn slug(&self) -> Option<&str> {
        Some(&self.slug)
    }

    fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn rating(&self) -> Option<f64> {
        self.rating
    }

    fn image(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }

    fn validate(&mut self) -> Result<(), AppError> {
        self.slug = normalize_slug(&self.slug)?;
        require_text(&self.title, "Title")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GameCategory {
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

impl Document for GameCategory {
    const COLLECTION: Collection = Collection::GameCategories;

    fn slug(&self) -> Option<&str> {
        Some(&self.slug)
    }

    fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn validate(&mut self) -> Result<(), AppError> {
        self.slug = normalize_slug(&self.slug)?;
        require_text(&self.name, "Name")
    }
}
