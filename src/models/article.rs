//! Blog posts and news articles.
//!
//! Both collections share one body shape; [`Blog`] and [`News`] only differ in
//! where they are stored and which permission guards them.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use super::content::{normalize_slug, require_text, Collection, Document, Seo, Visibility};
use crate::errors::AppError;

/// Editorial article body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Article {
    pub slug: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// Body (HTML)
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub related_sites: Vec<String>,
    #[serde(default)]
    pub related_blogs: Vec<String>,
    #[serde(default)]
    pub related_news: Vec<String>,
    #[serde(default)]
    pub related_coupons: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub seo: Seo,
}

impl Article {
    fn validate(&mut self) -> Result<(), AppError> {
        self.slug = normalize_slug(&self.slug)?;
        require_text(&self.title, "Title")?;
        Ok(())
    }
}

/// A blog post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blog(pub Article);

/// A news article.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct News(pub Article);

macro_rules! article_document {
    ($ty:ident, $collection:expr) => {
        impl Deref for $ty {
            type Target = Article;

            fn deref(&self) -> &Article {
                &self.0
            }
        }

        impl DerefMut for $ty {
            fn deref_mut(&mut self) -> &mut Article {
                &mut self.0
            }
        }

        impl Document for $ty {
            const COLLECTION: Collection = $collection;

            fn slug(&self) -> Option<&str> {
                Some(&self.0.slug)
            }

            fn visibility(&self) -> &Visibility {
                &self.0.visibility
            }

            fn title(&self) -> &str {
                &self.0.title
            }

            fn image(&self) -> Option<&str> {
                self.0.featured_image.as_deref()
            }

            fn validate(&mut self) -> Result<(), AppError> {
                self.0.validate()
            }
        }
    };
}

article_document!(Blog, Collection::Blogs);
article_document!(News, Collection::News);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_body_rejects_unknown_fields() {
        let ok = serde_json::from_str::<Blog>(
            r#"{"slug":"welcome","title":"Welcome","content":"<p>Hi</p>"}"#,
        );
        assert!(ok.is_ok());

        let bad = serde_json::from_str::<Blog>(
            r#"{"slug":"welcome","title":"Welcome","content":"","views":10}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_validate_normalizes_slug() {
        let mut news: News = serde_json::from_str(
            r#"{"slug":" Derby-Day ","title":"Derby day","content":""}"#,
        )
        .unwrap();
        news.validate().unwrap();
        assert_eq!(news.slug, "derby-day");

        news.title = "  ".to_string();
        assert!(news.validate().is_err());
    }
}
