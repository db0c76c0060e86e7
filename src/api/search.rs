//! Search API endpoints.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use super::{success, ApiResult, AppQuery};
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string.
    #[serde(default)]
    pub q: String,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// Search results with paging metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Single search result item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub kind: String,
    pub slug: String,
    pub title: String,
    pub url: String,
    pub score: f32,
}

/// Maximum number of search results allowed.
const MAX_SEARCH_LIMIT: usize = 100;

/// GET /api/search - Full-text search over published content.
pub async fn search_content(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let limit = params.limit.clamp(1, MAX_SEARCH_LIMIT);

    let results: Vec<SearchResultItem> = state
        .search
        .search(&params.q, limit, params.offset)?
        .into_iter()
        .map(|hit| SearchResultItem {
            url: format!("/{}", hit.slug),
            id: hit.id,
            kind: hit.kind,
            slug: hit.slug,
            title: hit.title,
            score: hit.score,
        })
        .collect();

    let total = results.len();

    success(SearchResponse {
        results,
        total,
        limit,
        offset: params.offset,
    })
}
