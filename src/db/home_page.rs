//! Home page configuration singleton persistence.

use chrono::Utc;
use sqlx::Row;

use super::Repository;
use crate::errors::AppError;
use crate::models::{HomePageConfig, HomeSections};

impl Repository {
    /// Read the default configuration, creating it on first read.
    pub async fn get_or_create_home_page(&self) -> Result<HomePageConfig, AppError> {
        if let Some(config) = self.find_home_page().await? {
            return Ok(config);
        }

        match self.create_home_page(HomeSections::default()).await {
            Ok(config) => {
                tracing::info!("Created default home page config");
                Ok(config)
            }
            // Lost a race with another first reader.
            Err(AppError::Conflict(_)) => self.find_home_page().await?.ok_or_else(|| {
                AppError::Internal("Home page config vanished after creation".to_string())
            }),
            Err(e) => Err(e),
        }
    }

    /// Read the default configuration if it exists.
    pub async fn find_home_page(&self) -> Result<Option<HomePageConfig>, AppError> {
        let row = sqlx::query(
            "SELECT id, is_default, sections, updated_at FROM home_page_config WHERE is_default = 1",
        )
        .fetch_optional(self.pool().await?)
        .await?;

        row.as_ref().map(home_page_from_row).transpose()
    }

    /// Insert the default configuration. Fails with `Conflict` if one exists.
    pub async fn create_home_page(
        &self,
        sections: HomeSections,
    ) -> Result<HomePageConfig, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let sections_json = serde_json::to_string(&sections)?;

        let result = sqlx::query(
            "INSERT INTO home_page_config (id, is_default, sections, updated_at) VALUES (?, 1, ?, ?)",
        )
        .bind(&id)
        .bind(&sections_json)
        .bind(&now)
        .execute(self.pool().await?)
        .await;

        match result {
            Ok(_) => Ok(HomePageConfig {
                id,
                is_default: true,
                sections,
                updated_at: now,
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                "A default home page config already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the sections of the default configuration.
    pub async fn update_home_page(
        &self,
        sections: HomeSections,
    ) -> Result<HomePageConfig, AppError> {
        let existing = self.get_or_create_home_page().await?;
        let now = Utc::now().to_rfc3339();
        let sections_json = serde_json::to_string(&sections)?;

        sqlx::query("UPDATE home_page_config SET sections = ?, updated_at = ? WHERE id = ?")
            .bind(&sections_json)
            .bind(&now)
            .bind(&existing.id)
            .execute(self.pool().await?)
            .await?;

        Ok(HomePageConfig {
            id: existing.id,
            is_default: true,
            sections,
            updated_at: now,
        })
    }
}

fn home_page_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<HomePageConfig, AppError> {
    let is_default: i32 = row.get("is_default");
    let sections: String = row.get("sections");
    Ok(HomePageConfig {
        id: row.get("id"),
        is_default: is_default != 0,
        sections: serde_json::from_str(&sections)?,
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use crate::db::test_repository;
    use crate::errors::AppError;
    use crate::models::HomeSections;

    #[tokio::test]
    async fn test_first_read_creates_exactly_one_default() {
        let (repo, _dir) = test_repository();
        assert!(repo.find_home_page().await.unwrap().is_none());

        let first = repo.get_or_create_home_page().await.unwrap();
        let second = repo.get_or_create_home_page().await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(first.is_default);
    }

    #[tokio::test]
    async fn test_second_default_is_conflict() {
        let (repo, _dir) = test_repository();
        repo.create_home_page(HomeSections::default()).await.unwrap();
        let err = repo
            .create_home_page(HomeSections::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_replaces_sections() {
        let (repo, _dir) = test_repository();
        let mut sections = HomeSections::default();
        sections.news.is_visible = false;
        sections.sites.selected_ids = vec!["s2".to_string(), "s1".to_string()];

        let updated = repo.update_home_page(sections.clone()).await.unwrap();
        assert_eq!(updated.sections, sections);
        let stored = repo.find_home_page().await.unwrap().unwrap();
        assert_eq!(stored.sections, sections);
    }
}
