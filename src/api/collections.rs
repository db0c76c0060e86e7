//! Generic admin CRUD endpoints, mounted once per content collection.

use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::{success, ApiResult, AppJson, AppQuery};
use crate::auth::{CurrentUser, OptionalUser};
use crate::errors::AppError;
use crate::models::{
    Blog, Coupon, Document, Game, GameCategory, News, Page, Promotion, Record, Site,
};
use crate::permissions::require_permission;
use crate::search::SearchIndex;
use crate::visibility::{ContentQuery, ListScope};
use crate::AppState;

/// A collection exposed through the admin API.
///
/// Searchable collections keep the search index in step with writes; the
/// default hooks do nothing.
pub trait AdminCollection: Document {
    fn reindex<'a>(
        _search: &'a SearchIndex,
        _record: &'a Record<Self>,
    ) -> BoxFuture<'a, Result<(), AppError>> {
        Box::pin(async { Ok(()) })
    }

    fn unindex<'a>(_search: &'a SearchIndex, _id: &'a str) -> BoxFuture<'a, Result<(), AppError>> {
        Box::pin(async { Ok(()) })
    }
}

macro_rules! searchable_collection {
    ($ty:ty) => {
        impl AdminCollection for $ty {
            fn reindex<'a>(
                search: &'a SearchIndex,
                record: &'a Record<Self>,
            ) -> BoxFuture<'a, Result<(), AppError>> {
                Box::pin(search.index_record(record))
            }

            fn unindex<'a>(
                search: &'a SearchIndex,
                id: &'a str,
            ) -> BoxFuture<'a, Result<(), AppError>> {
                Box::pin(search.remove::<$ty>(id))
            }
        }
    };
}

searchable_collection!(Site);
searchable_collection!(Blog);
searchable_collection!(News);

impl AdminCollection for Coupon {}
impl AdminCollection for Promotion {}
impl AdminCollection for Game {}
impl AdminCollection for GameCategory {}
impl AdminCollection for Page {}

/// Routes for one collection under `/api/admin/{collection}`.
pub fn collection_routes<D: AdminCollection>() -> Router<AppState> {
    let base = format!("/api/admin/{}", D::COLLECTION.as_str());
    Router::new()
        .route(
            &base,
            get(list_documents::<D>)
                .post(create_document::<D>)
                .patch(reorder_documents::<D>),
        )
        .route(
            &format!("{}/{{id}}", base),
            get(get_document::<D>)
                .put(replace_document::<D>)
                .delete(delete_document::<D>),
        )
}

/// Admin routes for every content collection.
pub fn content_routes() -> Router<AppState> {
    Router::new()
        .merge(collection_routes::<Site>())
        .merge(collection_routes::<Blog>())
        .merge(collection_routes::<News>())
        .merge(collection_routes::<Coupon>())
        .merge(collection_routes::<Promotion>())
        .merge(collection_routes::<Game>())
        .merge(collection_routes::<GameCategory>())
        .merge(collection_routes::<Page>())
}

/// List query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Restrict to documents flagged for the home page.
    #[serde(default)]
    pub home: bool,
}

/// Bulk reorder request: the new order of the collection.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub items: Vec<ReorderItem>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderItem {
    #[serde(rename = "_id")]
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct ReorderResponse {
    pub reordered: usize,
}

async fn sync_search<D: AdminCollection>(state: &AppState, record: &Record<D>) {
    if let Err(e) = D::reindex(&state.search, record).await {
        tracing::warn!(
            collection = D::COLLECTION.as_str(),
            id = %record.id,
            "Failed to update search index: {}",
            e
        );
    }
}

/// GET /api/admin/{collection} - List documents.
///
/// Signed-in admins see every status; anonymous callers only published ones.
pub async fn list_documents<D: AdminCollection>(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    AppQuery(params): AppQuery<ListParams>,
) -> ApiResult<Vec<Record<D>>> {
    let base = match user {
        Some(_) => ContentQuery::admin(),
        None => ContentQuery::public(),
    };
    let scope = if params.home { ListScope::Home } else { ListScope::All };

    success(state.repo.list::<D>(&base.with_scope(scope)).await?)
}

/// GET /api/admin/{collection}/{id} - Get a document.
pub async fn get_document<D: AdminCollection>(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Record<D>> {
    match state.repo.get::<D>(&id).await? {
        Some(record) => success(record),
        None => Err(AppError::NotFound(format!(
            "{} {} not found",
            D::COLLECTION.label(),
            id
        ))),
    }
}

/// POST /api/admin/{collection} - Create a document.
pub async fn create_document<D: AdminCollection>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(body): AppJson<D>,
) -> ApiResult<Record<D>> {
    require_permission(&user, D::COLLECTION.permission())?;

    let record = state.repo.create(body).await?;
    sync_search(&state, &record).await;

    success(record)
}

/// PUT /api/admin/{collection}/{id} - Replace a document.
pub async fn replace_document<D: AdminCollection>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    AppJson(body): AppJson<D>,
) -> ApiResult<Record<D>> {
    require_permission(&user, D::COLLECTION.permission())?;

    let record = state.repo.replace(&id, body).await?;
    sync_search(&state, &record).await;

    success(record)
}

/// DELETE /api/admin/{collection}/{id} - Delete a document.
pub async fn delete_document<D: AdminCollection>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    require_permission(&user, D::COLLECTION.permission())?;

    state.repo.delete::<D>(&id).await?;
    if let Err(e) = D::unindex(&state.search, &id).await {
        tracing::warn!(
            collection = D::COLLECTION.as_str(),
            id = %id,
            "Failed to remove from search index: {}",
            e
        );
    }

    success(())
}

/// PATCH /api/admin/{collection} - Bulk reorder.
pub async fn reorder_documents<D: AdminCollection>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<ReorderRequest>,
) -> ApiResult<ReorderResponse> {
    require_permission(&user, D::COLLECTION.permission())?;

    let ids: Vec<String> = request.items.into_iter().map(|item| item.id).collect();
    state.repo.reorder::<D>(&ids).await?;

    success(ReorderResponse {
        reordered: ids.len(),
    })
}
