//! Admin user management endpoints.

use axum::extract::{Path, State};

use super::{success, ApiResult, AppJson};
use crate::auth::{hash_password, validate_password, CurrentUser};
use crate::db::{NewUser, UserChanges};
use crate::errors::AppError;
use crate::models::{CreateUserRequest, Role, UpdateUserRequest, User};
use crate::permissions::{is_super_admin, require_permission, Permission};
use crate::AppState;

/// Only super-admins may create, promote or edit super-admins.
fn guard_super_admin_role(
    actor: &User,
    role: Option<Role>,
    target: Option<&User>,
) -> Result<(), AppError> {
    if is_super_admin(Some(actor)) {
        return Ok(());
    }
    if role == Some(Role::SuperAdmin) {
        return Err(AppError::Forbidden(
            "Only a super admin can grant the super admin role".to_string(),
        ));
    }
    if target.is_some_and(|t| t.role == Role::SuperAdmin) {
        return Err(AppError::Forbidden(
            "Only a super admin can modify a super admin".to_string(),
        ));
    }
    Ok(())
}

async fn load_user(state: &AppState, id: &str) -> Result<User, AppError> {
    state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
}

/// GET /api/admin/users - List users.
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Vec<User>> {
    require_permission(&actor, Permission::ManageAdmins)?;
    success(state.repo.list_users().await?)
}

/// GET /api/admin/users/{id} - Get a user.
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<User> {
    require_permission(&actor, Permission::ManageAdmins)?;
    success(load_user(&state, &id).await?)
}

/// POST /api/admin/users - Create a user.
pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    AppJson(request): AppJson<CreateUserRequest>,
) -> ApiResult<User> {
    require_permission(&actor, Permission::ManageAdmins)?;
    guard_super_admin_role(&actor, Some(request.role), None)?;

    if !request.email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    validate_password(&request.password)?;

    let password_hash = hash_password(&request.password)?;
    let user = state
        .repo
        .create_user(NewUser {
            email: &request.email,
            password_hash: &password_hash,
            name: request.name.trim(),
            role: request.role,
            permissions: &request.permissions,
            created_by: Some(&actor.id),
        })
        .await?;

    success(user)
}

/// PUT /api/admin/users/{id} - Update a user.
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateUserRequest>,
) -> ApiResult<User> {
    require_permission(&actor, Permission::ManageAdmins)?;
    let target = load_user(&state, &id).await?;
    guard_super_admin_role(&actor, request.role, Some(&target))?;

    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
    }
    let password_hash = match &request.password {
        Some(password) => {
            validate_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let user = state
        .repo
        .update_user(
            &id,
            UserChanges {
                name: request.name.map(|n| n.trim().to_string()),
                role: request.role,
                permissions: request.permissions,
                is_active: request.is_active,
                password_hash,
            },
        )
        .await?;

    tracing::info!(user_id = %id, actor = %actor.id, "User updated");
    success(user)
}

/// DELETE /api/admin/users/{id} - Deactivate a user.
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<User> {
    require_permission(&actor, Permission::ManageAdmins)?;
    if actor.id == id {
        return Err(AppError::Validation("You cannot delete your own account".to_string()));
    }
    let target = load_user(&state, &id).await?;
    guard_super_admin_role(&actor, None, Some(&target))?;

    let user = state.repo.deactivate_user(&id).await?;
    tracing::info!(user_id = %id, actor = %actor.id, "User deactivated");
    success(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, permissions: Vec<Permission>) -> User {
        User {
            id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            name: "U1".to_string(),
            role,
            permissions,
            is_active: true,
            created_by: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_admin_cannot_grant_or_touch_super_admin() {
        let admin = user(Role::Admin, vec![Permission::ManageAdmins]);
        let root = user(Role::SuperAdmin, Vec::new());

        assert!(matches!(
            guard_super_admin_role(&admin, Some(Role::SuperAdmin), None),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            guard_super_admin_role(&admin, None, Some(&root)),
            Err(AppError::Forbidden(_))
        ));
        assert!(guard_super_admin_role(&admin, Some(Role::Admin), Some(&admin)).is_ok());
        assert!(guard_super_admin_role(&root, Some(Role::SuperAdmin), Some(&root)).is_ok());
    }
}
