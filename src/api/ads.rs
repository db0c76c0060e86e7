//! Public ad lookup endpoint.

use axum::extract::State;
use serde::Deserialize;

use super::{success, ApiResult, AppQuery};
use crate::ads::{select_ads, ContextType};
use crate::models::{Promotion, Record};
use crate::AppState;

/// Ad lookup parameters.
#[derive(Debug, Deserialize)]
pub struct AdsQuery {
    /// `blog` or `news`
    #[serde(rename = "type", default)]
    pub context_type: String,
    #[serde(default)]
    pub id: String,
}

impl AdsQuery {
    fn context(&self) -> Option<ContextType> {
        match self.context_type.as_str() {
            "blog" => Some(ContextType::Blog),
            "news" => Some(ContextType::News),
            _ => None,
        }
    }
}

/// GET /api/ads - Ads eligible for a blog or news page.
///
/// Never fails: unknown contexts and store errors both yield an empty list.
pub async fn list_ads(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<AdsQuery>,
) -> ApiResult<Vec<Record<Promotion>>> {
    let ads = match params.context() {
        Some(context) if !params.id.is_empty() => {
            select_ads(&state.repo, context, &params.id).await
        }
        _ => Vec::new(),
    };
    success(ads)
}
