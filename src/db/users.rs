//! User and session persistence.

use chrono::{DateTime, Utc};
use sqlx::Row;

use super::Repository;
use crate::errors::AppError;
use crate::models::{Role, User};
use crate::permissions::Permission;

const USER_COLUMNS: &str =
    "id, email, name, role, permissions, is_active, created_by, created_at, updated_at";

/// Fields written when creating a user. The password is already hashed.
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
    pub role: Role,
    pub permissions: &'a [Permission],
    pub created_by: Option<&'a str>,
}

/// Fields changed on an existing user. `None` keeps the stored value.
#[derive(Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub permissions: Option<Vec<Permission>>,
    pub is_active: Option<bool>,
    pub password_hash: Option<String>,
}

impl Repository {
    // ==================== USER OPERATIONS ====================

    /// Count all users, active or not.
    pub async fn count_users(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(self.pool().await?)
            .await?;
        Ok(row.get("n"))
    }

    /// List all users.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at, email", USER_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(self.pool().await?).await?;
        rows.iter().map(user_from_row).collect()
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool().await?)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    /// Find a user and its password hash by (lower-cased) email.
    pub async fn find_user_credentials(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, AppError> {
        let sql = format!(
            "SELECT {}, password_hash FROM users WHERE email = ?",
            USER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(self.pool().await?)
            .await?;

        match row {
            Some(row) => Ok(Some((user_from_row(&row)?, row.get("password_hash")))),
            None => Ok(None),
        }
    }

    /// Create a new user.
    pub async fn create_user(&self, new_user: NewUser<'_>) -> Result<User, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let email = new_user.email.trim().to_lowercase();
        let permissions_json = serde_json::to_string(new_user.permissions)?;

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, name, role, permissions, is_active, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&email)
        .bind(new_user.password_hash)
        .bind(new_user.name)
        .bind(new_user.role.as_str())
        .bind(&permissions_json)
        .bind(new_user.created_by)
        .bind(&now)
        .bind(&now)
        .execute(self.pool().await?)
        .await?;

        tracing::info!(user_id = %id, role = new_user.role.as_str(), "User created");

        Ok(User {
            id,
            email,
            name: new_user.name.to_string(),
            role: new_user.role,
            permissions: new_user.permissions.to_vec(),
            is_active: true,
            created_by: new_user.created_by.map(str::to_string),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Update a user.
    ///
    /// Runs in a transaction so the last active super-admin can never be
    /// demoted or deactivated. Deactivation also revokes the user's sessions.
    pub async fn update_user(&self, id: &str, changes: UserChanges) -> Result<User, AppError> {
        let mut tx = self.pool().await?.begin().await?;

        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let existing = match sqlx::query(&sql).bind(id).fetch_optional(&mut *tx).await? {
            Some(row) => user_from_row(&row)?,
            None => return Err(AppError::NotFound(format!("User {} not found", id))),
        };

        let role = changes.role.unwrap_or(existing.role);
        let is_active = changes.is_active.unwrap_or(existing.is_active);
        let loses_super_admin = existing.is_active
            && existing.role == Role::SuperAdmin
            && (role != Role::SuperAdmin || !is_active);

        if loses_super_admin {
            let row = sqlx::query(
                "SELECT COUNT(*) AS n FROM users WHERE role = ? AND is_active = 1 AND id != ?",
            )
            .bind(Role::SuperAdmin.as_str())
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            let others: i64 = row.get("n");
            if others == 0 {
                return Err(AppError::Conflict(
                    "Cannot remove the last active super admin".to_string(),
                ));
            }
        }

        let now = Utc::now().to_rfc3339();
        let name = changes.name.unwrap_or(existing.name);
        let permissions = changes.permissions.unwrap_or(existing.permissions);
        let permissions_json = serde_json::to_string(&permissions)?;

        sqlx::query(
            "UPDATE users SET name = ?, role = ?, permissions = ?, is_active = ?, password_hash = COALESCE(?, password_hash), updated_at = ? WHERE id = ?"
        )
        .bind(&name)
        .bind(role.as_str())
        .bind(&permissions_json)
        .bind(is_active as i32)
        .bind(&changes.password_hash)
        .bind(&now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if !is_active {
            sqlx::query("DELETE FROM sessions WHERE user_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(User {
            id: id.to_string(),
            email: existing.email,
            name,
            role,
            permissions,
            is_active,
            created_by: existing.created_by,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Soft-delete a user by marking it inactive.
    pub async fn deactivate_user(&self, id: &str) -> Result<User, AppError> {
        self.update_user(
            id,
            UserChanges {
                is_active: Some(false),
                ..UserChanges::default()
            },
        )
        .await
    }

    // ==================== SESSION OPERATIONS ====================

    /// Store a session. Only the hash of the secret is persisted.
    pub async fn create_session(
        &self,
        session_id: &str,
        secret_hash: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO sessions (id, secret_hash, user_id, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(secret_hash)
        .bind(user_id)
        .bind(expires_at.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(self.pool().await?)
        .await?;
        Ok(())
    }

    /// Look up an unexpired session: returns its secret hash and user.
    pub async fn find_session(&self, session_id: &str) -> Result<Option<(String, User)>, AppError> {
        let row = sqlx::query("SELECT secret_hash, user_id, expires_at FROM sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(self.pool().await?)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: String = row.get("expires_at");
        let expired = DateTime::parse_from_rfc3339(&expires_at)
            .map(|t| t.with_timezone(&Utc) <= Utc::now())
            .unwrap_or(true);
        if expired {
            self.delete_session(session_id).await?;
            return Ok(None);
        }

        let user_id: String = row.get("user_id");
        Ok(self
            .get_user(&user_id)
            .await?
            .map(|user| (row.get("secret_hash"), user)))
    }

    /// Revoke a session.
    pub async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(self.pool().await?)
            .await?;
        Ok(())
    }
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, AppError> {
    let role: String = row.get("role");
    let permissions: String = row.get("permissions");
    let is_active: i32 = row.get("is_active");
    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        role: role.parse()?,
        permissions: serde_json::from_str(&permissions)?,
        is_active: is_active != 0,
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
