//! Home page configuration endpoints.

use axum::extract::State;

use super::{success, ApiResult, AppJson};
use crate::auth::CurrentUser;
use crate::models::{HomePageConfig, HomePageRequest};
use crate::permissions::{require_permission, Permission};
use crate::AppState;

/// GET /api/admin/home-page - Read the configuration, creating the default on
/// first read.
pub async fn get_home_page(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> ApiResult<HomePageConfig> {
    success(state.repo.get_or_create_home_page().await?)
}

/// POST /api/admin/home-page - Create the configuration. A second create is a
/// conflict.
pub async fn create_home_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<HomePageRequest>,
) -> ApiResult<HomePageConfig> {
    require_permission(&user, Permission::ManageHomePage)?;
    success(state.repo.create_home_page(request.sections).await?)
}

/// PUT /api/admin/home-page - Replace the curated sections.
pub async fn update_home_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<HomePageRequest>,
) -> ApiResult<HomePageConfig> {
    require_permission(&user, Permission::ManageHomePage)?;
    let config = state.repo.update_home_page(request.sections).await?;
    tracing::info!(actor = %user.id, "Home page config updated");
    success(config)
}
