//! Configuration module for the CMS backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Credentials used to seed the first super-admin on an empty user table.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Lifetime of an admin session
    pub session_ttl_hours: i64,
    /// Seed account, only used while no user exists
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Public site name shown in page titles
    pub site_name: String,
}

/// Invalid configuration value.
#[derive(Debug)]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.key, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("CMS_DB_PATH")
            .unwrap_or_else(|_| "./data/cms.sqlite".to_string())
            .into();

        let index_path = env::var("CMS_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let bind_addr = env::var("CMS_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| ConfigError {
                key: "CMS_BIND_ADDR",
                message: format!("{}", e),
            })?;

        let log_level = env::var("CMS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let session_ttl_hours = match env::var("CMS_SESSION_TTL_HOURS") {
            Ok(raw) => raw.parse().map_err(|e| ConfigError {
                key: "CMS_SESSION_TTL_HOURS",
                message: format!("{}", e),
            })?,
            Err(_) => 24,
        };

        let bootstrap_admin = match (
            env::var("CMS_BOOTSTRAP_EMAIL"),
            env::var("CMS_BOOTSTRAP_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(BootstrapAdmin {
                email,
                password,
                name: env::var("CMS_BOOTSTRAP_NAME")
                    .unwrap_or_else(|_| "Administrator".to_string()),
            }),
            _ => None,
        };

        let site_name = env::var("CMS_SITE_NAME").unwrap_or_else(|_| "Affiliate CMS".to_string());

        Ok(Self {
            db_path,
            index_path,
            bind_addr,
            log_level,
            session_ttl_hours,
            bootstrap_admin,
            site_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("CMS_DB_PATH");
        env::remove_var("CMS_INDEX_PATH");
        env::remove_var("CMS_BIND_ADDR");
        env::remove_var("CMS_LOG_LEVEL");
        env::remove_var("CMS_SESSION_TTL_HOURS");
        env::remove_var("CMS_BOOTSTRAP_EMAIL");
        env::remove_var("CMS_BOOTSTRAP_PASSWORD");

        let config = Config::from_env().unwrap();

        assert_eq!(config.db_path, PathBuf::from("./data/cms.sqlite"));
        assert_eq!(config.index_path, PathBuf::from("./data/index"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.session_ttl_hours, 24);
        assert!(config.bootstrap_admin.is_none());
    }
}
