//! Database repository for content documents.
//!
//! Every collection goes through the same typed operations; the `Document`
//! implementation decides the collection and which columns are mirrored.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use futures::future::join_all;
use sqlx::{Row, SqlitePool};

use super::ContentStore;
use crate::errors::AppError;
use crate::models::{Document, Record};
use crate::visibility::{order_clause, ContentQuery};

const DOCUMENT_COLUMNS: &str = "id, data, created_at, updated_at";

/// Database repository for all data operations.
pub struct Repository {
    store: ContentStore,
}

impl Repository {
    pub fn new(store: ContentStore) -> Self {
        Self { store }
    }

    pub(super) async fn pool(&self) -> Result<&SqlitePool, AppError> {
        self.store.pool().await
    }

    // ==================== READS ====================

    /// List a collection through the visibility filter.
    pub async fn list<D: Document>(
        &self,
        query: &ContentQuery,
    ) -> Result<Vec<Record<D>>, AppError> {
        let sql = format!(
            "SELECT {} FROM documents WHERE collection = ?{} {}",
            DOCUMENT_COLUMNS,
            query.sql_conditions(),
            order_clause(D::COLLECTION)
        );
        let rows = sqlx::query(&sql)
            .bind(D::COLLECTION.as_str())
            .fetch_all(self.pool().await?)
            .await?;

        rows.iter().map(record_from_row).collect()
    }

    /// Get a document by id, unfiltered.
    pub async fn get<D: Document>(&self, id: &str) -> Result<Option<Record<D>>, AppError> {
        let sql = format!(
            "SELECT {} FROM documents WHERE collection = ? AND id = ?",
            DOCUMENT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(D::COLLECTION.as_str())
            .bind(id)
            .fetch_optional(self.pool().await?)
            .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    /// Populate weak references: fetch `ids` in the given order, silently
    /// omitting ids that do not exist or are filtered out.
    pub async fn get_many<D: Document>(
        &self,
        ids: &[String],
        query: &ContentQuery,
    ) -> Result<Vec<Record<D>>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM documents WHERE collection = ? AND id IN ({}){}",
            DOCUMENT_COLUMNS,
            placeholders,
            query.sql_conditions()
        );
        let mut q = sqlx::query(&sql).bind(D::COLLECTION.as_str());
        for id in ids {
            q = q.bind(id);
        }
        let rows = q.fetch_all(self.pool().await?).await?;

        let mut found: HashMap<String, Record<D>> = HashMap::new();
        for row in &rows {
            match record_from_row::<D>(row) {
                Ok(record) => {
                    found.insert(record.id.clone(), record);
                }
                Err(e) => tracing::warn!("Skipping undecodable {}: {}", D::COLLECTION.label(), e),
            }
        }

        let mut seen = HashSet::new();
        Ok(ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| found.remove(id))
            .collect())
    }

    /// Find a document by slug through the visibility filter.
    pub async fn find_by_slug<D: Document>(
        &self,
        slug: &str,
        query: &ContentQuery,
    ) -> Result<Option<Record<D>>, AppError> {
        let sql = format!(
            "SELECT {} FROM documents WHERE collection = ? AND slug = ?{}",
            DOCUMENT_COLUMNS,
            query.sql_conditions()
        );
        let row = sqlx::query(&sql)
            .bind(D::COLLECTION.as_str())
            .bind(slug)
            .fetch_optional(self.pool().await?)
            .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    // ==================== WRITES ====================

    /// Create a new document. The body is validated first.
    pub async fn create<D: Document>(&self, mut body: D) -> Result<Record<D>, AppError> {
        body.validate()?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let data = serde_json::to_string(&body)?;
        let visibility = body.visibility();

        sqlx::query(
            "INSERT INTO documents (collection, id, slug, status, display_order, show_on_home, is_featured, rating, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(D::COLLECTION.as_str())
        .bind(&id)
        .bind(body.slug())
        .bind(visibility.status.as_str())
        .bind(visibility.display_order)
        .bind(visibility.show_on_home as i32)
        .bind(visibility.is_featured as i32)
        .bind(body.rating())
        .bind(&data)
        .bind(&now)
        .bind(&now)
        .execute(self.pool().await?)
        .await?;

        tracing::info!(collection = D::COLLECTION.as_str(), id = %id, "Document created");

        Ok(Record {
            id,
            body,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Replace the body of an existing document, keeping id and creation time.
    pub async fn replace<D: Document>(&self, id: &str, mut body: D) -> Result<Record<D>, AppError> {
        body.validate()?;

        let existing = self.get::<D>(id).await?.ok_or_else(|| not_found::<D>(id))?;

        let now = Utc::now().to_rfc3339();
        let data = serde_json::to_string(&body)?;
        let visibility = body.visibility();

        let result = sqlx::query(
            "UPDATE documents SET slug = ?, status = ?, display_order = ?, show_on_home = ?, is_featured = ?, rating = ?, data = ?, updated_at = ? WHERE collection = ? AND id = ?"
        )
        .bind(body.slug())
        .bind(visibility.status.as_str())
        .bind(visibility.display_order)
        .bind(visibility.show_on_home as i32)
        .bind(visibility.is_featured as i32)
        .bind(body.rating())
        .bind(&data)
        .bind(&now)
        .bind(D::COLLECTION.as_str())
        .bind(id)
        .execute(self.pool().await?)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found::<D>(id));
        }

        Ok(Record {
            id: id.to_string(),
            body,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Delete a document.
    pub async fn delete<D: Document>(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(D::COLLECTION.as_str())
            .bind(id)
            .execute(self.pool().await?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found::<D>(id));
        }

        tracing::info!(collection = D::COLLECTION.as_str(), id = %id, "Document deleted");
        Ok(())
    }

    /// Bulk reorder: each listed document gets `displayOrder` equal to its
    /// position in `ids`.
    ///
    /// Updates are issued concurrently and independently; there is no
    /// transaction, so a failure part-way leaves the successful updates in
    /// place. The first failure is returned.
    pub async fn reorder<D: Document>(&self, ids: &[String]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Err(AppError::Validation("No items provided".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(AppError::Validation(format!("Duplicate item {}", dup)));
        }

        let pool = self.pool().await?;
        let now = Utc::now().to_rfc3339();

        let updates = ids.iter().enumerate().map(|(position, id)| {
            let now = now.clone();
            async move {
                let position = position as i64;
                let result = sqlx::query(
                    "UPDATE documents SET display_order = ?, data = json_set(data, '$.visibility.displayOrder', ?), updated_at = ? WHERE collection = ? AND id = ?"
                )
                .bind(position)
                .bind(position)
                .bind(&now)
                .bind(D::COLLECTION.as_str())
                .bind(id)
                .execute(pool)
                .await;
                (id, result)
            }
        });

        let mut first_error = None;
        let mut applied = 0usize;
        for (id, result) in join_all(updates).await {
            match result {
                Ok(r) if r.rows_affected() == 1 => applied += 1,
                Ok(_) => {
                    tracing::warn!(
                        collection = D::COLLECTION.as_str(),
                        id = %id,
                        "Reorder target missing"
                    );
                    first_error.get_or_insert_with(|| not_found::<D>(id));
                }
                Err(e) => {
                    tracing::warn!(
                        collection = D::COLLECTION.as_str(),
                        id = %id,
                        "Reorder update failed: {}",
                        e
                    );
                    first_error.get_or_insert_with(|| AppError::from(e));
                }
            }
        }

        tracing::info!(
            collection = D::COLLECTION.as_str(),
            applied,
            requested = ids.len(),
            "Reorder finished"
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

pub(super) fn not_found<D: Document>(id: &str) -> AppError {
    AppError::NotFound(format!("{} {} not found", D::COLLECTION.label(), id))
}

fn record_from_row<D: Document>(row: &sqlx::sqlite::SqliteRow) -> Result<Record<D>, AppError> {
    let data: String = row.get("data");
    Ok(Record {
        id: row.get("id"),
        body: serde_json::from_str(&data)?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_repository as test_repo;
    use crate::models::{Article, Blog, Site, Status, Visibility};

    fn blog(slug: &str, status: Status) -> Blog {
        Blog(Article {
            slug: slug.to_string(),
            title: format!("Post {}", slug),
            excerpt: None,
            content: "<p>Body</p>".to_string(),
            author: None,
            featured_image: None,
            tags: Vec::new(),
            related_sites: Vec::new(),
            related_blogs: Vec::new(),
            related_news: Vec::new(),
            related_coupons: Vec::new(),
            visibility: Visibility {
                status,
                ..Visibility::default()
            },
            seo: Default::default(),
        })
    }

    #[tokio::test]
    async fn test_create_get_replace_delete() {
        let (repo, _dir) = test_repo();

        let created = repo.create(blog("first", Status::Draft)).await.unwrap();
        let fetched = repo.get::<Blog>(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.body.slug, "first");

        let mut body = fetched.body.clone();
        body.title = "Renamed".to_string();
        let replaced = repo.replace(&created.id, body).await.unwrap();
        assert_eq!(replaced.body.title, "Renamed");
        assert_eq!(replaced.created_at, created.created_at);

        repo.delete::<Blog>(&created.id).await.unwrap();
        assert!(repo.get::<Blog>(&created.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete::<Blog>(&created.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_slug_in_collection_is_validation_error() {
        let (repo, _dir) = test_repo();
        repo.create(blog("dup", Status::Published)).await.unwrap();
        let err = repo.create(blog("dup", Status::Draft)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Slug already exists"));
    }

    #[tokio::test]
    async fn test_same_slug_allowed_across_collections() {
        let (repo, _dir) = test_repo();
        repo.create(blog("shared", Status::Published)).await.unwrap();
        let site = Site {
            slug: "shared".to_string(),
            name: "Shared".to_string(),
            logo: None,
            rating: 4.0,
            bonus: None,
            affiliate_url: "https://example.com".to_string(),
            summary: None,
            content: String::new(),
            pros: Vec::new(),
            cons: Vec::new(),
            visibility: Visibility::default(),
            seo: Default::default(),
        };
        assert!(repo.create(site).await.is_ok());
    }

    #[tokio::test]
    async fn test_public_list_hides_unpublished() {
        let (repo, _dir) = test_repo();
        repo.create(blog("live", Status::Published)).await.unwrap();
        repo.create(blog("wip", Status::Draft)).await.unwrap();
        repo.create(blog("old", Status::Archived)).await.unwrap();

        let public = repo.list::<Blog>(&ContentQuery::public()).await.unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].body.slug, "live");

        let admin = repo.list::<Blog>(&ContentQuery::admin()).await.unwrap();
        assert_eq!(admin.len(), 3);
    }

    #[tokio::test]
    async fn test_reorder_assigns_contiguous_positions() {
        let (repo, _dir) = test_repo();
        let a = repo.create(blog("a", Status::Published)).await.unwrap();
        let b = repo.create(blog("b", Status::Published)).await.unwrap();
        let c = repo.create(blog("c", Status::Published)).await.unwrap();

        let order = vec![c.id.clone(), a.id.clone(), b.id.clone()];
        repo.reorder::<Blog>(&order).await.unwrap();
        repo.reorder::<Blog>(&order).await.unwrap();

        let listed = repo.list::<Blog>(&ContentQuery::admin()).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![c.id.as_str(), a.id.as_str(), b.id.as_str()]);
        let orders: Vec<i64> = listed.iter().map(|r| r.body.visibility.display_order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_reorder_rejects_bad_input_and_reports_missing() {
        let (repo, _dir) = test_repo();
        let a = repo.create(blog("a", Status::Published)).await.unwrap();

        assert!(matches!(repo.reorder::<Blog>(&[]).await, Err(AppError::Validation(_))));
        assert!(matches!(
            repo.reorder::<Blog>(&[a.id.clone(), a.id.clone()]).await,
            Err(AppError::Validation(_))
        ));

        let err = repo
            .reorder::<Blog>(&["missing".to_string(), a.id.clone()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        // The existing document was still moved.
        let moved = repo.get::<Blog>(&a.id).await.unwrap().unwrap();
        assert_eq!(moved.body.visibility.display_order, 1);
    }

    #[tokio::test]
    async fn test_get_many_preserves_order_and_skips_dangling() {
        let (repo, _dir) = test_repo();
        let a = repo.create(blog("a", Status::Published)).await.unwrap();
        let b = repo.create(blog("b", Status::Draft)).await.unwrap();
        let c = repo.create(blog("c", Status::Published)).await.unwrap();

        let ids = vec![c.id.clone(), "ghost".to_string(), b.id.clone(), a.id.clone()];
        let public = repo.get_many::<Blog>(&ids, &ContentQuery::public()).await.unwrap();
        let got: Vec<&str> = public.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(got, vec![c.id.as_str(), a.id.as_str()]);

        let admin = repo.get_many::<Blog>(&ids, &ContentQuery::admin()).await.unwrap();
        assert_eq!(admin.len(), 3);
    }
}
