//! Server-rendered public site.
//!
//! `GET /` renders the curated home page and `GET /{slug}` renders whatever
//! the slug resolves to. Anything that cannot be shown renders the generic
//! not-found page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::ads::{select_ads, splice_ads, AdRotator, ContextType, Placement, Segment};
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{
    Article, Blog, Coupon, Document, Game, HomeSection, HomeSections, News, Page, Promotion, Record,
    Site,
};
use crate::slug::{resolve, RelatedContent, Resolved, Summary};
use crate::visibility::ContentQuery;
use crate::AppState;

/// Card shown in listings.
#[derive(Debug, Clone)]
pub struct CardView {
    pub title: String,
    pub url: String,
    pub image: Option<String>,
}

fn document_card<D: Document>(record: &Record<D>) -> CardView {
    CardView {
        title: record.body.title().to_string(),
        url: format!("/{}", record.body.slug().unwrap_or(&record.id)),
        image: record.body.image().map(str::to_string),
    }
}

/// Games have no page of their own; their card links to the game itself.
fn game_card(record: &Record<Game>) -> CardView {
    CardView {
        title: record.body.title.clone(),
        url: record.body.play_url.clone().unwrap_or_else(|| "#".to_string()),
        image: record.body.thumbnail.clone(),
    }
}

impl From<&Summary> for CardView {
    fn from(summary: &Summary) -> Self {
        Self {
            title: summary.title.clone(),
            url: format!("/{}", summary.slug.as_deref().unwrap_or(&summary.id)),
            image: summary.image.clone(),
        }
    }
}

/// One curated home page section.
#[derive(Debug, Clone)]
pub struct SectionView {
    pub heading: &'static str,
    pub cards: Vec<CardView>,
}

/// A coupon as shown on the home page.
#[derive(Debug, Clone)]
pub struct CouponView {
    pub title: String,
    pub code: String,
    pub discount: Option<String>,
    pub redirect_url: String,
}

impl From<&Record<Coupon>> for CouponView {
    fn from(record: &Record<Coupon>) -> Self {
        Self {
            title: record.body.title.clone(),
            code: record.body.code.clone(),
            discount: record.body.discount.clone(),
            redirect_url: record.body.redirect_url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdView {
    pub title: String,
    pub image: Option<String>,
    pub redirect_url: String,
    pub cta_text: String,
}

/// An ad rotator instance.
#[derive(Debug, Clone)]
pub struct RotatorView {
    pub placement: &'static str,
    pub interval_ms: u128,
    /// A single ad is shown without a timer
    pub rotates: bool,
    pub ads: Vec<AdView>,
}

impl RotatorView {
    fn new(placement: Placement, ads: &[Record<Promotion>]) -> Self {
        let vertical = placement == Placement::Sidebar;
        Self {
            placement: placement.as_str(),
            interval_ms: placement.default_interval().as_millis(),
            rotates: AdRotator::new(ads.len()).is_rotating(),
            ads: ads
                .iter()
                .map(|record| {
                    let images = &record.body.images;
                    let image = if vertical {
                        images.vertical.clone().or_else(|| images.horizontal.clone())
                    } else {
                        images.horizontal.clone().or_else(|| images.vertical.clone())
                    };
                    AdView {
                        title: record.body.title.clone(),
                        image,
                        redirect_url: record.body.redirect_url.clone(),
                        cta_text: record.body.cta_text.clone(),
                    }
                })
                .collect(),
        }
    }
}

/// Article body block; `None` marks an in-article ad slot.
#[derive(Debug, Clone)]
pub struct BlockView {
    pub html: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub site_name: String,
    pub title: String,
    pub sections: Vec<SectionView>,
    pub coupons: Vec<CouponView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "site.html")]
pub struct SiteTemplate {
    pub site_name: String,
    pub title: String,
    pub meta_description: Option<String>,
    pub site: Site,
}

#[derive(Template, WebTemplate)]
#[template(path = "article.html")]
pub struct ArticleTemplate {
    pub site_name: String,
    pub title: String,
    pub meta_description: Option<String>,
    pub kind: &'static str,
    pub article: Article,
    pub blocks: Vec<BlockView>,
    pub sidebar: RotatorView,
    pub in_article: RotatorView,
    pub related: Vec<SectionView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "page.html")]
pub struct PageTemplate {
    pub site_name: String,
    pub title: String,
    pub meta_description: Option<String>,
    pub content: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub site_name: String,
    pub title: String,
}

fn not_found(state: &AppState) -> Response {
    (
        StatusCode::NOT_FOUND,
        NotFoundTemplate {
            site_name: state.config.site_name.clone(),
            title: "Page not found".to_string(),
        },
    )
        .into_response()
}

/// Curated ids in selected order, or the home-flagged listing when nothing is
/// selected. Hidden sections are empty.
async fn section_records<D: Document>(
    repo: &Repository,
    section: &HomeSection,
) -> Result<Vec<Record<D>>, AppError> {
    if !section.is_visible {
        return Ok(Vec::new());
    }
    if section.selected_ids.is_empty() {
        repo.list::<D>(&ContentQuery::home()).await
    } else {
        repo.get_many::<D>(&section.selected_ids, &ContentQuery::public())
            .await
    }
}

async fn section_cards<D: Document>(
    repo: &Repository,
    heading: &'static str,
    section: &HomeSection,
    to_card: fn(&Record<D>) -> CardView,
) -> Option<SectionView> {
    match section_records::<D>(repo, section).await {
        Ok(records) if !records.is_empty() => Some(SectionView {
            heading,
            cards: records.iter().map(to_card).collect(),
        }),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(section = heading, "Home section failed to load: {}", e);
            None
        }
    }
}

/// GET / - Home page.
pub async fn home(State(state): State<AppState>) -> Response {
    let repo = &state.repo;
    let sections: HomeSections = match repo.get_or_create_home_page().await {
        Ok(config) => config.sections,
        Err(e) => {
            tracing::warn!("Home page config unavailable, using defaults: {}", e);
            HomeSections::default()
        }
    };

    let (sites, blogs, news, games) = tokio::join!(
        section_cards::<Site>(repo, "Top sites", &sections.sites, document_card),
        section_cards::<Blog>(repo, "Latest from the blog", &sections.blogs, document_card),
        section_cards::<News>(repo, "News", &sections.news, document_card),
        section_cards::<Game>(repo, "Games", &sections.games, game_card),
    );

    let coupons = match section_records::<Coupon>(repo, &sections.coupons).await {
        Ok(records) => records.iter().map(CouponView::from).collect(),
        Err(e) => {
            tracing::warn!("Coupons failed to load: {}", e);
            Vec::new()
        }
    };

    HomeTemplate {
        site_name: state.config.site_name.clone(),
        title: state.config.site_name.clone(),
        sections: [sites, blogs, news, games].into_iter().flatten().collect(),
        coupons,
    }
    .into_response()
}

fn related_sections(related: &RelatedContent) -> Vec<SectionView> {
    [
        ("Related sites", &related.sites),
        ("Related posts", &related.blogs),
        ("Related news", &related.news),
        ("Related coupons", &related.coupons),
    ]
    .into_iter()
    .filter(|(_, items)| !items.is_empty())
    .map(|(heading, items)| SectionView {
        heading,
        cards: items.iter().map(CardView::from).collect(),
    })
    .collect()
}

async fn render_article(
    state: &AppState,
    kind: &'static str,
    context: ContextType,
    id: &str,
    article: Article,
    related: &RelatedContent,
) -> Response {
    let ads = select_ads(&state.repo, context, id).await;

    let blocks = splice_ads(&article.content, !ads.is_empty())
        .into_iter()
        .map(|segment| match segment {
            Segment::Html(html) => BlockView { html: Some(html) },
            Segment::Ad => BlockView { html: None },
        })
        .collect();

    ArticleTemplate {
        site_name: state.config.site_name.clone(),
        title: article
            .seo
            .meta_title
            .clone()
            .unwrap_or_else(|| article.title.clone()),
        meta_description: article
            .seo
            .meta_description
            .clone()
            .or_else(|| article.excerpt.clone()),
        kind,
        blocks,
        sidebar: RotatorView::new(Placement::Sidebar, &ads),
        in_article: RotatorView::new(Placement::InArticle, &ads),
        related: related_sections(related),
        article,
    }
    .into_response()
}

async fn render_page(state: &AppState, slug: &str) -> Result<Option<Response>, AppError> {
    let page = state
        .repo
        .find_by_slug::<Page>(slug, &ContentQuery::public())
        .await?;
    Ok(page.map(|record| {
        let page = record.body;
        PageTemplate {
            site_name: state.config.site_name.clone(),
            title: page.seo.meta_title.clone().unwrap_or(page.title),
            meta_description: page.seo.meta_description,
            content: page.content,
        }
        .into_response()
    }))
}

/// GET /{slug} - Site review, blog post, news article or static page.
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let resolved = match resolve(&state.repo, &slug).await {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!(slug = %slug, "Slug resolution failed: {}", e);
            return not_found(&state);
        }
    };

    if let Some(resolved) = &resolved {
        tracing::debug!(slug = %slug, kind = resolved.kind(), id = resolved.id(), "Slug resolved");
    }

    match resolved {
        Some(Resolved::Site(record)) => {
            let site = record.body;
            SiteTemplate {
                site_name: state.config.site_name.clone(),
                title: site.seo.meta_title.clone().unwrap_or_else(|| site.name.clone()),
                meta_description: site
                    .seo
                    .meta_description
                    .clone()
                    .or_else(|| site.summary.clone()),
                site,
            }
            .into_response()
        }
        Some(Resolved::Blog(page)) => {
            let id = page.record.id;
            render_article(
                &state,
                "blog",
                ContextType::Blog,
                &id,
                page.record.body.0,
                &page.related,
            )
            .await
        }
        Some(Resolved::News(page)) => {
            let id = page.record.id;
            render_article(
                &state,
                "news",
                ContextType::News,
                &id,
                page.record.body.0,
                &page.related,
            )
            .await
        }
        None => match render_page(&state, &slug.trim().to_lowercase()).await {
            Ok(Some(response)) => response,
            Ok(None) => not_found(&state),
            Err(e) => {
                tracing::error!(slug = %slug, "Page lookup failed: {}", e);
                not_found(&state)
            }
        },
    }
}

/// Fallback for unmatched routes.
pub async fn fallback(State(state): State<AppState>) -> Response {
    not_found(&state)
}
