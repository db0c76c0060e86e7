//! Session authentication for the admin API.
//!
//! Passwords are hashed with argon2. A login issues a bearer token of the form
//! `{session_id}.{secret}`; only the SHA-256 of the secret is stored and it is
//! compared in constant time.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::db::{NewUser, Repository};
use crate::errors::AppError;
use crate::models::{LoginResponse, Role, User};
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 8;
const SECRET_BYTES: usize = 32;

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a password against a stored hash. Unparsable hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Split a bearer token into session id and secret.
fn split_token(token: &str) -> Option<(&str, &str)> {
    let (session_id, secret) = token.split_once('.')?;
    if session_id.is_empty() || secret.is_empty() {
        return None;
    }
    Some((session_id, secret))
}

/// Bearer token from the `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Check credentials and open a session.
pub async fn login(
    repo: &Repository,
    config: &Config,
    email: &str,
    password: &str,
) -> Result<LoginResponse, AppError> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let (user, password_hash) = repo.find_user_credentials(email).await?.ok_or_else(invalid)?;
    if !verify_password(password, &password_hash) {
        tracing::warn!(user_id = %user.id, "Failed login attempt");
        return Err(invalid());
    }
    if !user.is_active {
        tracing::warn!(user_id = %user.id, "Login refused for inactive user");
        return Err(AppError::Unauthorized("Account is disabled".to_string()));
    }

    let session_id = uuid::Uuid::new_v4().to_string();
    let secret = generate_secret();
    let expires_at = Utc::now() + Duration::hours(config.session_ttl_hours);
    repo.create_session(&session_id, &hash_secret(&secret), &user.id, expires_at)
        .await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(LoginResponse {
        token: format!("{}.{}", session_id, secret),
        expires_at: expires_at.to_rfc3339(),
        user,
    })
}

/// Resolve a bearer token to an active user.
pub async fn authenticate(repo: &Repository, token: &str) -> Result<User, AppError> {
    let invalid = || AppError::Unauthorized("Invalid or expired session".to_string());

    let (session_id, secret) = split_token(token).ok_or_else(invalid)?;
    let (stored_hash, user) = repo.find_session(session_id).await?.ok_or_else(invalid)?;

    if !constant_time_compare(&hash_secret(secret), &stored_hash) {
        tracing::warn!(session_id, "Session secret mismatch");
        return Err(invalid());
    }
    if !user.is_active {
        return Err(invalid());
    }
    Ok(user)
}

/// Revoke the session behind a token. Unknown tokens are ignored.
pub async fn logout(repo: &Repository, token: &str) -> Result<(), AppError> {
    if let Some((session_id, _)) = split_token(token) {
        repo.delete_session(session_id).await?;
    }
    Ok(())
}

/// Seed the first super-admin when the user table is empty.
pub async fn bootstrap_super_admin(
    repo: &Repository,
    config: &Config,
) -> Result<Option<User>, AppError> {
    let Some(seed) = &config.bootstrap_admin else {
        return Ok(None);
    };
    if repo.count_users().await? > 0 {
        return Ok(None);
    }

    validate_password(&seed.password)?;
    let password_hash = hash_password(&seed.password)?;
    let user = repo
        .create_user(NewUser {
            email: &seed.email,
            password_hash: &password_hash,
            name: &seed.name,
            role: Role::SuperAdmin,
            permissions: &[],
            created_by: None,
        })
        .await?;

    tracing::info!(email = %user.email, "Bootstrapped super admin");
    Ok(Some(user))
}

/// The authenticated user. Rejects with 401 when the session is missing or
/// invalid.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;
        let user = CurrentUser(authenticate(&state.repo, token).await?);

        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// The user behind the request, if a session was presented.
///
/// A presented but invalid session is still rejected.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<User>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if bearer_token(&parts.headers).is_none() {
            return Ok(OptionalUser(None));
        }
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        Ok(OptionalUser(Some(user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BootstrapAdmin;
    use crate::db::test_repository;

    fn test_config() -> Config {
        Config {
            db_path: "unused".into(),
            index_path: "unused".into(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "debug".to_string(),
            session_ttl_hours: 1,
            bootstrap_admin: Some(BootstrapAdmin {
                email: "Root@Example.com".to_string(),
                password: "correct horse".to_string(),
                name: "Root".to_string(),
            }),
            site_name: "Test".to_string(),
        }
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("short", "much-longer-value"));
        assert!(constant_time_compare("", ""));
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password("hunter2hunter2", &hash));
        assert!(!verify_password("hunter3hunter3", &hash));
        assert!(!verify_password("hunter2hunter2", "not-a-hash"));
    }

    #[test]
    fn test_split_token() {
        assert_eq!(split_token("sid.secret"), Some(("sid", "secret")));
        assert_eq!(split_token("nodot"), None);
        assert_eq!(split_token(".secret"), None);
        assert_eq!(split_token("sid."), None);
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));
        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn test_bootstrap_login_authenticate_logout() {
        let (repo, _dir) = test_repository();
        let config = test_config();

        let root = bootstrap_super_admin(&repo, &config).await.unwrap().unwrap();
        assert_eq!(root.role, Role::SuperAdmin);
        assert!(bootstrap_super_admin(&repo, &config).await.unwrap().is_none());

        assert!(matches!(
            login(&repo, &config, "root@example.com", "wrong password").await,
            Err(AppError::Unauthorized(_))
        ));

        let session = login(&repo, &config, "root@example.com", "correct horse")
            .await
            .unwrap();
        let user = authenticate(&repo, &session.token).await.unwrap();
        assert_eq!(user.id, root.id);

        let (sid, _) = split_token(&session.token).unwrap();
        let forged = format!("{}.{}", sid, "0".repeat(64));
        assert!(authenticate(&repo, &forged).await.is_err());

        logout(&repo, &session.token).await.unwrap();
        assert!(matches!(
            authenticate(&repo, &session.token).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
