//! Permission evaluation for admin users.
//!
//! Every mutating admin handler goes through [`require_permission`]; role logic
//! is not re-derived anywhere else.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Role, User};

/// A grantable permission key.
///
/// Unknown keys fail deserialization, so an invalid key never reaches the store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageSites,
    ManageBlogs,
    ManageNews,
    ManageCoupons,
    ManagePromotions,
    ManageGames,
    ManagePages,
    ManageHomePage,
    ManageSettings,
    ManageAdmins,
}

impl Permission {
    /// The full permission universe, granted implicitly to super-admins.
    pub const ALL: [Permission; 10] = [
        Permission::ManageSites,
        Permission::ManageBlogs,
        Permission::ManageNews,
        Permission::ManageCoupons,
        Permission::ManagePromotions,
        Permission::ManageGames,
        Permission::ManagePages,
        Permission::ManageHomePage,
        Permission::ManageSettings,
        Permission::ManageAdmins,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageSites => "manage_sites",
            Permission::ManageBlogs => "manage_blogs",
            Permission::ManageNews => "manage_news",
            Permission::ManageCoupons => "manage_coupons",
            Permission::ManagePromotions => "manage_promotions",
            Permission::ManageGames => "manage_games",
            Permission::ManagePages => "manage_pages",
            Permission::ManageHomePage => "manage_home_page",
            Permission::ManageSettings => "manage_settings",
            Permission::ManageAdmins => "manage_admins",
        }
    }
}

/// Whether the user holds the super-admin role.
///
/// Anonymous and deactivated users are never super-admins.
pub fn is_super_admin(user: Option<&User>) -> bool {
    matches!(user, Some(u) if u.is_active && u.role == Role::SuperAdmin)
}

/// Whether the user may act under `key`.
pub fn has_permission(user: Option<&User>, key: Permission) -> bool {
    let Some(user) = user else {
        return false;
    };
    if !user.is_active {
        return false;
    }
    match user.role {
        Role::SuperAdmin => true,
        Role::Admin => user.permissions.contains(&key),
    }
}

/// The permission set the user effectively holds.
pub fn effective_permissions(user: &User) -> Vec<Permission> {
    if !user.is_active {
        return Vec::new();
    }
    match user.role {
        Role::SuperAdmin => Permission::ALL.to_vec(),
        Role::Admin => {
            let mut keys = user.permissions.clone();
            keys.sort();
            keys.dedup();
            keys
        }
    }
}

/// Reject the request with `Forbidden` unless the user holds `key`.
pub fn require_permission(user: &User, key: Permission) -> Result<(), AppError> {
    if has_permission(Some(user), key) {
        Ok(())
    } else {
        tracing::debug!(user_id = %user.id, permission = key.as_str(), "Permission denied");
        Err(AppError::Forbidden(format!(
            "Missing permission: {}",
            key.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, permissions: Vec<Permission>) -> User {
        User {
            id: "u1".to_string(),
            email: "editor@example.com".to_string(),
            name: "Editor".to_string(),
            role,
            permissions,
            is_active: true,
            created_by: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_super_admin_has_every_permission() {
        let admin = user(Role::SuperAdmin, Vec::new());
        for key in Permission::ALL {
            assert!(has_permission(Some(&admin), key), "{}", key.as_str());
        }
        assert!(is_super_admin(Some(&admin)));
    }

    #[test]
    fn test_admin_without_permissions_has_none() {
        let admin = user(Role::Admin, Vec::new());
        for key in Permission::ALL {
            assert!(!has_permission(Some(&admin), key));
        }
        assert!(!is_super_admin(Some(&admin)));
    }

    #[test]
    fn test_admin_permission_membership() {
        let admin = user(Role::Admin, vec![Permission::ManageBlogs]);
        assert!(has_permission(Some(&admin), Permission::ManageBlogs));
        assert!(!has_permission(Some(&admin), Permission::ManageNews));
        assert!(require_permission(&admin, Permission::ManageAdmins).is_err());
    }

    #[test]
    fn test_anonymous_and_inactive() {
        assert!(!has_permission(None, Permission::ManageSites));
        assert!(!is_super_admin(None));

        let mut admin = user(Role::SuperAdmin, Vec::new());
        admin.is_active = false;
        assert!(!has_permission(Some(&admin), Permission::ManageSites));
        assert!(!is_super_admin(Some(&admin)));
        assert!(effective_permissions(&admin).is_empty());
    }

    #[test]
    fn test_effective_permissions() {
        let admin = user(
            Role::Admin,
            vec![Permission::ManageNews, Permission::ManageBlogs, Permission::ManageNews],
        );
        assert_eq!(
            effective_permissions(&admin),
            vec![Permission::ManageBlogs, Permission::ManageNews]
        );
        let root = user(Role::SuperAdmin, Vec::new());
        assert_eq!(effective_permissions(&root).len(), Permission::ALL.len());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(serde_json::from_str::<Permission>("\"manage_everything\"").is_err());
        assert_eq!(
            serde_json::from_str::<Permission>("\"manage_home_page\"").unwrap(),
            Permission::ManageHomePage
        );
        for key in Permission::ALL {
            let json = format!("\"{}\"", key.as_str());
            assert_eq!(serde_json::from_str::<Permission>(&json).unwrap(), key);
        }
    }
}
