//! Tantivy-based search index module.
//!
//! Provides full-text search over published sites, blogs and news with field
//! boosting. Only published documents are ever present in the index.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, QueryParser};
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{Blog, Document, News, Record, Site};
use crate::visibility::ContentQuery;

const BOOST_TITLE: f32 = 10.0;
const BOOST_EXCERPT: f32 = 6.0;
const BOOST_CONTENT: f32 = 3.0;

/// Deepest hit a page may reach (`offset + limit`).
pub const MAX_RESULT_WINDOW: usize = 10_000;

/// Documents that can be placed in the search index.
pub trait Searchable: Document {
    /// Short teaser text.
    fn excerpt(&self) -> Option<&str>;

    /// Body HTML.
    fn body(&self) -> &str;
}

impl Searchable for Site {
    fn excerpt(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    fn body(&self) -> &str {
        &self.content
    }
}

impl Searchable for Blog {
    fn excerpt(&self) -> Option<&str> {
        self.0.excerpt.as_deref()
    }

    fn body(&self) -> &str {
        &self.0.content
    }
}

impl Searchable for News {
    fn excerpt(&self) -> Option<&str> {
        self.0.excerpt.as_deref()
    }

    fn body(&self) -> &str {
        &self.0.content
    }
}

/// A single search hit.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Collection name (`sites`, `blogs`, `news`)
    pub kind: String,
    pub id: String,
    pub slug: String,
    pub title: String,
    pub score: f32,
}

/// Search index schema fields.
struct SearchFields {
    doc_key: Field,
    kind: Field,
    id: Field,
    slug: Field,
    title: Field,
    excerpt: Field,
    content: Field,
}

/// Tantivy search index for public content.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

fn doc_key<D: Document>(id: &str) -> String {
    format!("{}:{}", D::COLLECTION.as_str(), id)
}

/// Drop markup so tags are not indexed as words.
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        // Define schema
        let mut schema_builder = Schema::builder();
        let doc_key = schema_builder.add_text_field("doc_key", STRING | STORED);
        let kind = schema_builder.add_text_field("kind", STRING | STORED);
        let id = schema_builder.add_text_field("id", STORED);
        let slug = schema_builder.add_text_field("slug", STORED);
        let title = schema_builder.add_text_field("title", TEXT | STORED);
        let excerpt = schema_builder.add_text_field("excerpt", TEXT);
        let content = schema_builder.add_text_field("content", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            doc_key,
            kind,
            id,
            slug,
            title,
            excerpt,
            content,
        };

        // Try to open existing index or create new one
        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Rebuild the entire index from the published content in the store.
    pub async fn rebuild(&self, repo: &Repository) -> Result<usize, AppError> {
        let query = ContentQuery::public();
        let sites = repo.list::<Site>(&query).await?;
        let blogs = repo.list::<Blog>(&query).await?;
        let news = repo.list::<News>(&query).await?;

        let mut writer = self.writer.write().await;
        writer.delete_all_documents()?;

        let mut count = 0;
        for record in &sites {
            writer.add_document(self.create_document(record))?;
            count += 1;
        }
        for record in &blogs {
            writer.add_document(self.create_document(record))?;
            count += 1;
        }
        for record in &news {
            writer.add_document(self.create_document(record))?;
            count += 1;
        }

        writer.commit()?;
        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} documents", count);
        Ok(count)
    }

    /// Add, refresh or drop a document depending on whether it is published.
    pub async fn index_record<D: Searchable>(&self, record: &Record<D>) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(Term::from_field_text(
            self.fields.doc_key,
            &doc_key::<D>(&record.id),
        ));
        if ContentQuery::public().permits(&record.body) {
            writer.add_document(self.create_document(record))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Remove a document from the index.
    pub async fn remove<D: Searchable>(&self, id: &str) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(Term::from_field_text(self.fields.doc_key, &doc_key::<D>(id)));
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Search for published content matching the query.
    pub fn search(
        &self,
        query_str: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        let window = limit.saturating_add(offset).min(MAX_RESULT_WINDOW);
        if query_str.trim().is_empty() || limit == 0 || offset >= window {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let query_parser = QueryParser::for_index(
            &self.index,
            vec![self.fields.title, self.fields.excerpt, self.fields.content],
        );

        let base_query = query_parser
            .parse_query(query_str)
            .map_err(|e| AppError::Validation(format!("Invalid search query: {}", e)))?;

        let mut subqueries: Vec<(Occur, Box<dyn tantivy::query::Query>)> = Vec::new();

        let field_queries = [
            (self.fields.title, BOOST_TITLE),
            (self.fields.excerpt, BOOST_EXCERPT),
            (self.fields.content, BOOST_CONTENT),
        ];

        for (field, boost) in field_queries {
            let field_parser = QueryParser::for_index(&self.index, vec![field]);
            if let Ok(field_query) = field_parser.parse_query(query_str) {
                let boosted = BoostQuery::new(field_query, boost);
                subqueries.push((Occur::Should, Box::new(boosted)));
            }
        }

        let combined_query = if subqueries.is_empty() {
            base_query
        } else {
            Box::new(BooleanQuery::new(subqueries))
        };

        let top_docs = searcher
            .search(&combined_query, &TopDocs::with_limit(window))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let text = |doc: &TantivyDocument, field: Field| -> Option<String> {
            Some(doc.get_first(field)?.as_str()?.to_string())
        };

        let results = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                Some(SearchResult {
                    kind: text(&doc, self.fields.kind)?,
                    id: text(&doc, self.fields.id)?,
                    slug: text(&doc, self.fields.slug).unwrap_or_default(),
                    title: text(&doc, self.fields.title).unwrap_or_default(),
                    score,
                })
            })
            .collect();

        Ok(results)
    }

    fn create_document<D: Searchable>(&self, record: &Record<D>) -> TantivyDocument {
        let body = &record.body;
        doc!(
            self.fields.doc_key => doc_key::<D>(&record.id),
            self.fields.kind => D::COLLECTION.as_str().to_string(),
            self.fields.id => record.id.clone(),
            self.fields.slug => body.slug().unwrap_or_default().to_string(),
            self.fields.title => body.title().to_string(),
            self.fields.excerpt => body.excerpt().unwrap_or_default().to_string(),
            self.fields.content => strip_tags(body.body())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_repository;
    use crate::models::{Article, Status, Visibility};
    use tempfile::TempDir;

    fn blog(slug: &str, title: &str, content: &str, status: Status) -> Blog {
        Blog(Article {
            slug: slug.to_string(),
            title: title.to_string(),
            excerpt: None,
            content: content.to_string(),
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

    #[test]
    fn test_strip_tags() {
        let words: Vec<_> = strip_tags("<p>Free <b>spins</b></p>")
            .split_whitespace()
            .map(str::to_string)
            .collect();
        assert_eq!(words, vec!["Free", "spins"]);
    }

    #[tokio::test]
    async fn test_rebuild_indexes_only_published() {
        let (repo, _db_dir) = test_repository();
        let index_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(index_dir.path()).unwrap();

        let live = repo
            .create(blog("live", "Cashback offers", "<p>Weekly cashback</p>", Status::Published))
            .await
            .unwrap();
        repo.create(blog("wip", "Cashback draft", "<p>Draft cashback</p>", Status::Draft))
            .await
            .unwrap();

        assert_eq!(index.rebuild(&repo).await.unwrap(), 1);

        let results = index.search("cashback", 10, 0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, live.id);
        assert_eq!(results[0].kind, "blogs");
        assert_eq!(results[0].slug, "live");
    }

    #[tokio::test]
    async fn test_index_record_follows_publication() {
        let (repo, _db_dir) = test_repository();
        let index_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(index_dir.path()).unwrap();

        let mut record = repo
            .create(blog("derby", "Derby preview", "<p>Odds</p>", Status::Published))
            .await
            .unwrap();
        index.index_record(&record).await.unwrap();
        assert_eq!(index.search("derby", 10, 0).unwrap().len(), 1);

        record.body.visibility.status = Status::Archived;
        index.index_record(&record).await.unwrap();
        assert!(index.search("derby", 10, 0).unwrap().is_empty());

        record.body.visibility.status = Status::Published;
        index.index_record(&record).await.unwrap();
        index.remove::<Blog>(&record.id).await.unwrap();
        assert!(index.search("derby", 10, 0).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_empty_query() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(temp_dir.path()).unwrap();

        let results = index.search("", 10, 0).unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_window_edges() {
        let (repo, _db_dir) = test_repository();
        let index_dir = TempDir::new().unwrap();
        let index = SearchIndex::open(index_dir.path()).unwrap();

        let record = repo
            .create(blog("derby", "Derby preview", "<p>Odds</p>", Status::Published))
            .await
            .unwrap();
        index.index_record(&record).await.unwrap();

        assert!(index.search("derby", 0, 0).unwrap().is_empty());
        assert!(index.search("derby", 10, usize::MAX).unwrap().is_empty());
        assert_eq!(index.search("derby", usize::MAX, 0).unwrap().len(), 1);
        assert!(index
            .search("derby", 10, MAX_RESULT_WINDOW)
            .unwrap()
            .is_empty());
    }
}
