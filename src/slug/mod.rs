//! Slug resolution for public URLs.
//!
//! Sites, blogs and news share one public namespace. A slug is looked up in
//! that order and the first published match wins; slugs are only unique within
//! a collection.

use serde::Serialize;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{normalize_slug, Article, Blog, Coupon, Document, News, Record, Site};
use crate::visibility::ContentQuery;

/// Compact view of a referenced document.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl<D: Document> From<&Record<D>> for Summary {
    fn from(record: &Record<D>) -> Self {
        Self {
            id: record.id.clone(),
            slug: record.body.slug().map(str::to_string),
            title: record.body.title().to_string(),
            image: record.body.image().map(str::to_string),
        }
    }
}

/// References of an article expanded into summaries.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedContent {
    pub sites: Vec<Summary>,
    pub blogs: Vec<Summary>,
    pub news: Vec<Summary>,
    pub coupons: Vec<Summary>,
}

/// A blog post or news article ready for rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePage<D> {
    #[serde(flatten)]
    pub record: Record<D>,
    pub related: RelatedContent,
}

/// What a slug resolved to.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "item", rename_all = "lowercase")]
pub enum Resolved {
    Site(Record<Site>),
    Blog(ArticlePage<Blog>),
    News(ArticlePage<News>),
}

impl Resolved {
    pub fn id(&self) -> &str {
        match self {
            Resolved::Site(r) => &r.id,
            Resolved::Blog(p) => &p.record.id,
            Resolved::News(p) => &p.record.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Resolved::Site(_) => "site",
            Resolved::Blog(_) => "blog",
            Resolved::News(_) => "news",
        }
    }
}

/// Resolve a public slug.
///
/// Only published documents are considered; a slug owned by a draft reads as
/// not found. Malformed slugs never match.
pub async fn resolve(repo: &Repository, raw_slug: &str) -> Result<Option<Resolved>, AppError> {
    let Ok(slug) = normalize_slug(raw_slug) else {
        return Ok(None);
    };
    let query = ContentQuery::public();

    if let Some(site) = repo.find_by_slug::<Site>(&slug, &query).await? {
        return Ok(Some(Resolved::Site(site)));
    }

    if let Some(blog) = repo.find_by_slug::<Blog>(&slug, &query).await? {
        let related = expand_related(repo, &blog.body).await;
        return Ok(Some(Resolved::Blog(ArticlePage {
            record: blog,
            related,
        })));
    }

    if let Some(news) = repo.find_by_slug::<News>(&slug, &query).await? {
        let related = expand_related(repo, &news.body).await;
        return Ok(Some(Resolved::News(ArticlePage {
            record: news,
            related,
        })));
    }

    tracing::debug!(slug = %slug, "Slug did not resolve");
    Ok(None)
}

/// Expand an article's weak references. Dangling or unpublished ids are
/// dropped; a failing lookup leaves that list empty.
pub async fn expand_related(repo: &Repository, article: &Article) -> RelatedContent {
    let (sites, blogs, news, coupons) = tokio::join!(
        summaries::<Site>(repo, &article.related_sites),
        summaries::<Blog>(repo, &article.related_blogs),
        summaries::<News>(repo, &article.related_news),
        summaries::<Coupon>(repo, &article.related_coupons),
    );
    RelatedContent {
        sites,
        blogs,
        news,
        coupons,
    }
}

async fn summaries<D: Document>(repo: &Repository, ids: &[String]) -> Vec<Summary> {
    match repo.get_many::<D>(ids, &ContentQuery::public()).await {
        Ok(records) => {
            if records.len() < ids.len() {
                tracing::debug!(
                    collection = D::COLLECTION.as_str(),
                    requested = ids.len(),
                    found = records.len(),
                    "Omitting unresolved references"
                );
            }
            records.iter().map(Summary::from).collect()
        }
        Err(e) => {
            tracing::warn!(
                collection = D::COLLECTION.as_str(),
                "Reference expansion failed: {}",
                e
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_repository;
    use crate::models::{Status, Visibility};

    fn published() -> Visibility {
        Visibility {
            status: Status::Published,
            ..Visibility::default()
        }
    }

    fn site(slug: &str) -> Site {
        Site {
            slug: slug.to_string(),
            name: format!("Site {}", slug),
            logo: Some("/img/logo.png".to_string()),
            rating: 4.5,
            bonus: None,
            affiliate_url: "https://example.com/aff".to_string(),
            summary: None,
            content: String::new(),
            pros: Vec::new(),
            cons: Vec::new(),
            visibility: published(),
            seo: Default::default(),
        }
    }

    fn article(slug: &str, status: Status) -> Article {
        Article {
            slug: slug.to_string(),
            title: format!("Article {}", slug),
            excerpt: None,
            content: "<p>Body</p>".to_string(),
            author: None,
            featured_image: None,
            tags: Vec::new(),
            related_sites: Vec::new(),
            related_blogs: Vec::new(),
            related_news: Vec::new(),
            related_coupons: Vec::new(),
            visibility: Visibility {
                status,
                ..Visibility::default()
            },
            seo: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_site_wins_slug_collision() {
        let (repo, _dir) = test_repository();
        let s = repo.create(site("x")).await.unwrap();
        repo.create(Blog(article("x", Status::Published))).await.unwrap();

        match resolve(&repo, "x").await.unwrap() {
            Some(Resolved::Site(found)) => assert_eq!(found.id, s.id),
            other => panic!("expected site, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blog_probed_before_news() {
        let (repo, _dir) = test_repository();
        repo.create(News(article("shared", Status::Published))).await.unwrap();
        let blog = repo.create(Blog(article("shared", Status::Published))).await.unwrap();

        let resolved = resolve(&repo, "shared").await.unwrap().unwrap();
        assert_eq!(resolved.kind(), "blog");
        assert_eq!(resolved.id(), blog.id);
    }

    #[tokio::test]
    async fn test_draft_is_not_found() {
        let (repo, _dir) = test_repository();
        repo.create(Blog(article("y", Status::Draft))).await.unwrap();
        assert!(resolve(&repo, "y").await.unwrap().is_none());

        // A draft site does not shadow a published news item.
        let mut draft_site = site("z");
        draft_site.visibility.status = Status::Draft;
        repo.create(draft_site).await.unwrap();
        repo.create(News(article("z", Status::Published))).await.unwrap();
        assert_eq!(resolve(&repo, "z").await.unwrap().unwrap().kind(), "news");
    }

    #[tokio::test]
    async fn test_slug_is_normalized_and_malformed_never_matches() {
        let (repo, _dir) = test_repository();
        repo.create(site("best-odds")).await.unwrap();
        assert!(resolve(&repo, " Best-Odds ").await.unwrap().is_some());
        assert!(resolve(&repo, "best odds").await.unwrap().is_none());
        assert!(resolve(&repo, "").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_related_references_tolerate_dangling_ids() {
        let (repo, _dir) = test_repository();
        let s = repo.create(site("partner")).await.unwrap();
        let hidden = repo.create(Blog(article("hidden", Status::Hidden))).await.unwrap();
        let other = repo.create(Blog(article("other", Status::Published))).await.unwrap();

        let mut body = article("main", Status::Published);
        body.related_sites = vec!["deleted-site".to_string(), s.id.clone()];
        body.related_blogs = vec![hidden.id.clone(), other.id.clone()];
        body.related_coupons = vec!["ghost".to_string()];
        repo.create(Blog(body)).await.unwrap();

        let Some(Resolved::Blog(page)) = resolve(&repo, "main").await.unwrap() else {
            panic!("expected blog");
        };
        assert_eq!(
            page.related.sites,
            vec![Summary {
                id: s.id.clone(),
                slug: Some("partner".to_string()),
                title: "Site partner".to_string(),
                image: Some("/img/logo.png".to_string()),
            }]
        );
        assert_eq!(page.related.blogs.len(), 1);
        assert_eq!(page.related.blogs[0].id, other.id);
        assert!(page.related.news.is_empty());
        assert!(page.related.coupons.is_empty());
    }
}
