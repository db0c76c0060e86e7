//! Ad targeting: which published banners may appear on a blog or news page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Repository;
use crate::models::{DisplayMode, Promotion, PromotionKind, Record};
use crate::visibility::ContentQuery;

/// Kind of page an ad is targeted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextType {
    Blog,
    News,
}

/// Whether `promotion` may be shown on the page identified by `context`.
///
/// Broadcast (`all`) banners go everywhere; `specific` banners only where
/// listed; any other mode is never eligible.
pub fn is_eligible(promotion: &Promotion, context: ContextType, context_id: &str) -> bool {
    let settings = &promotion.display_settings;
    match settings.mode {
        DisplayMode::All => true,
        DisplayMode::Specific => {
            let included = match context {
                ContextType::Blog => &settings.included_blogs,
                ContextType::News => &settings.included_news,
            };
            included.iter().any(|id| id == context_id)
        }
        DisplayMode::Unknown => false,
    }
}

/// Filter candidates down to eligible published ad banners, most recently
/// updated first with ties broken by id.
pub fn rank_ads(
    candidates: Vec<Record<Promotion>>,
    context: ContextType,
    context_id: &str,
) -> Vec<Record<Promotion>> {
    let mut ads: Vec<Record<Promotion>> = candidates
        .into_iter()
        .filter(|r| r.body.visibility.is_published())
        .filter(|r| r.body.kind == PromotionKind::AdBanner)
        .filter(|r| is_eligible(&r.body, context, context_id))
        .collect();

    ads.sort_by(|a, b| {
        updated_at(b)
            .cmp(&updated_at(a))
            .then_with(|| a.id.cmp(&b.id))
    });
    ads
}

fn updated_at(record: &Record<Promotion>) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&record.updated_at)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Select the ads for a page.
///
/// Ads never break a page: if the store cannot be read the result is empty.
pub async fn select_ads(
    repo: &Repository,
    context: ContextType,
    context_id: &str,
) -> Vec<Record<Promotion>> {
    match repo.list::<Promotion>(&ContentQuery::public()).await {
        Ok(candidates) => rank_ads(candidates, context, context_id),
        Err(e) => {
            tracing::warn!(?context, context_id, "Ad lookup failed, rendering without ads: {}", e);
            Vec::new()
        }
    }
}
