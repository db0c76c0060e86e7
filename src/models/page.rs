//! Static pages (about, terms, responsible gambling).

use serde::{Deserialize, Serialize};

use super::content::{normalize_slug, require_text, Collection, Document, Seo, Visibility};
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Page {
    pub slug: String,
    pub title: String,
    /// Body (HTML)
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub seo: Seo,
}

impl Document for Page {
    const COLLECTION: Collection = Collection::Pages;

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
        require_text(&self.title, "Title")
    }
}
