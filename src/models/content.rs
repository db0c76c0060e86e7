//! Shared content building blocks: visibility, SEO metadata and the
//! [`Document`] trait every stored collection implements.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::permissions::Permission;

/// Publication lifecycle of a content item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Draft,
    Published,
    Archived,
    Hidden,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Published => "published",
            Status::Archived => "archived",
            Status::Hidden => "hidden",
        }
    }
}

/// Visibility and curation flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Visibility {
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default)]
    pub show_on_home: bool,
    #[serde(default)]
    pub is_featured: bool,
}

impl Visibility {
    pub fn is_published(&self) -> bool {
        self.status == Status::Published
    }
}

/// SEO metadata bag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Seo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
}

/// Stored content collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Sites,
    Blogs,
    News,
    Coupons,
    Promotions,
    Games,
    GameCategories,
    Pages,
}

impl Collection {
    /// Value of the `collection` column, also used as the admin URL segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Sites => "sites",
            Collection::Blogs => "blogs",
            Collection::News => "news",
            Collection::Coupons => "coupons",
            Collection::Promotions => "promotions",
            Collection::Games => "games",
            Collection::GameCategories => "game-categories",
            Collection::Pages => "pages",
        }
    }

    /// Singular name used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            Collection::Sites => "Site",
            Collection::Blogs => "Blog",
            Collection::News => "News",
            Collection::Coupons => "Coupon",
            Collection::Promotions => "Promotion",
            Collection::Games => "Game",
            Collection::GameCategories => "Game category",
            Collection::Pages => "Page",
        }
    }

    /// Permission guarding writes to this collection.
    pub fn permission(&self) -> Permission {
        match self {
            Collection::Sites => Permission::ManageSites,
            Collection::Blogs => Permission::ManageBlogs,
            Collection::News => Permission::ManageNews,
            Collection::Coupons => Permission::ManageCoupons,
            Collection::Promotions => Permission::ManagePromotions,
            Collection::Games | Collection::GameCategories => Permission::ManageGames,
            Collection::Pages => Permission::ManagePages,
        }
    }
}

/// A stored document body.
///
/// The body is exactly what admins submit: create and replace both take the
/// full body, and `deny_unknown_fields` on every implementor keeps stray keys
/// out of the store. Ids and timestamps live next to the body in [`Record`].
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    /// `None` for collections without public URLs.
    fn slug(&self) -> Option<&str>;

    fn visibility(&self) -> &Visibility;

    /// Display title used for summaries and search.
    fn title(&self) -> &str;

    /// Secondary sort key for sites.
    fn rating(&self) -> Option<f64> {
        None
    }

    /// Thumbnail shown in summaries.
    fn image(&self) -> Option<&str> {
        None
    }

    /// Normalize and check the body before it is written.
    fn validate(&mut self) -> Result<(), AppError>;
}

/// A document together with its identity and timestamps.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<T> {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub body: T,
    pub created_at: String,
    pub updated_at: String,
}

/// Normalize a slug and reject anything outside `[a-z0-9-]`.
pub fn normalize_slug(raw: &str) -> Result<String, AppError> {
    let slug = raw.trim().to_lowercase();
    if slug.is_empty() {
        return Err(AppError::Validation("Slug is required".to_string()));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(AppError::Validation(format!(
            "Slug '{}' may only contain lowercase letters, digits and hyphens",
            slug
        )));
    }
    Ok(slug)
}

/// Reject blank required text fields.
pub fn require_text(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_slug() {
        assert_eq!(normalize_slug("  Best-Bookmakers-2026 ").unwrap(), "best-bookmakers-2026");
        assert!(normalize_slug("   ").is_err());
        assert!(normalize_slug("bad slug").is_err());
        assert!(normalize_slug("über").is_err());
    }

    #[test]
    fn test_visibility_defaults_to_draft() {
        let vis: Visibility = serde_json::from_str("{}").unwrap();
        assert_eq!(vis.status, Status::Draft);
        assert_eq!(vis.display_order, 0);
        assert!(!vis.show_on_home);
        assert!(!vis.is_published());
    }

    #[test]
    fn test_visibility_rejects_unknown_fields() {
        let pinned = r#"{"status":"published","pinned":true}"#;
        assert!(serde_json::from_str::<Visibility>(pinned).is_err());
        assert!(serde_json::from_str::<Visibility>(r#"{"status":"live"}"#).is_err());
    }
}
