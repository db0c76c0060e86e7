//! Login, logout and current-user endpoints.

use axum::{extract::State, http::HeaderMap};

use super::{success, ApiResult, AppJson};
use crate::auth::{self, bearer_token, CurrentUser};
use crate::models::{CurrentUserView, LoginRequest, LoginResponse};
use crate::permissions::{effective_permissions, is_super_admin};
use crate::AppState;

/// POST /api/auth/login - Open a session.
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    success(auth::login(&state.repo, &state.config, &request.email, &request.password).await?)
}

/// POST /api/auth/logout - Revoke the presented session.
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
) -> ApiResult<()> {
    if let Some(token) = bearer_token(&headers) {
        auth::logout(&state.repo, token).await?;
    }
    tracing::info!(user_id = %user.id, "User logged out");
    success(())
}

/// GET /api/auth/me - The signed-in user and its effective permissions.
pub async fn me(CurrentUser(user): CurrentUser) -> ApiResult<CurrentUserView> {
    success(CurrentUserView {
        effective_permissions: effective_permissions(&user),
        is_super_admin: is_super_admin(Some(&user)),
        user,
    })
}
