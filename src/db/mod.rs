//! Database module for SQLite persistence.
//!
//! SQLite is the content store. Content collections share one `documents`
//! table: filterable fields are mirrored into columns, the full body is kept
//! as JSON in `data`.

mod home_page;
mod repository;
mod users;

pub use repository::*;
pub use users::{NewUser, UserChanges};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::OnceCell;

use crate::errors::AppError;

/// Process-wide handle to the content store.
///
/// The pool is opened on first use and reused for the lifetime of the
/// process. Callers racing during that first connection all await the same
/// in-flight attempt.
pub struct ContentStore {
    db_path: PathBuf,
    pool: OnceCell<SqlitePool>,
    connect_attempts: AtomicUsize,
}

impl ContentStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            pool: OnceCell::new(),
            connect_attempts: AtomicUsize::new(0),
        }
    }

    /// Get the pool, connecting and migrating on first call.
    pub async fn pool(&self) -> Result<&SqlitePool, AppError> {
        self.pool
            .get_or_try_init(|| async {
                self.connect_attempts.fetch_add(1, Ordering::SeqCst);
                tracing::info!("Opening content store at {:?}", self.db_path);
                init_database(&self.db_path).await.map_err(AppError::from)
            })
            .await
    }

    /// Number of times a connection was attempted.
    #[cfg(test)]
    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }
}

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            slug TEXT,
            status TEXT NOT NULL,
            display_order INTEGER NOT NULL DEFAULT 0,
            show_on_home INTEGER NOT NULL DEFAULT 0,
            is_featured INTEGER NOT NULL DEFAULT 0,
            rating REAL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (collection, id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            name TEXT NOT NULL,
            role TEXT NOT NULL,
            permissions TEXT NOT NULL DEFAULT '[]',
            is_active INTEGER NOT NULL DEFAULT 1,
            created_by TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            secret_hash TEXT NOT NULL,
            user_id TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS home_page_config (
            id TEXT PRIMARY KEY,
            is_default INTEGER NOT NULL DEFAULT 1,
            sections TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_documents_slug
            ON documents(collection, slug) WHERE slug IS NOT NULL;
        CREATE INDEX IF NOT EXISTS idx_documents_listing
            ON documents(collection, status, display_order);
        CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_home_page_default
            ON home_page_config(is_default) WHERE is_default = 1;
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Fresh repository over a temporary database.
#[cfg(test)]
pub(crate) fn test_repository() -> (Repository, tempfile::TempDir) {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let store = ContentStore::new(temp_dir.path().join("cms.sqlite"));
    (Repository::new(store), temp_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_concurrent_first_use_connects_once() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(ContentStore::new(temp_dir.path().join("cms.sqlite")));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.pool().await.is_ok() }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(store.connect_attempts(), 1);
        store.pool().await.unwrap();
        assert_eq!(store.connect_attempts(), 1);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("cms.sqlite");
        let pool = init_database(&db_path).await.unwrap();
        run_migrations(&pool).await.unwrap();
    }
}
