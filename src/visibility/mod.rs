//! Publication filtering and listing order.
//!
//! Public viewers only ever see published documents. Authenticated admin reads
//! bypass the filter entirely.

use crate::models::{Collection, Document, Status};

/// Who is reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Public,
    Admin,
}

/// Which slice of a collection is listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All,
    /// Only documents flagged `showOnHome`
    Home,
}

/// Filter applied to every content read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentQuery {
    pub viewer: Viewer,
    pub scope: ListScope,
}

impl ContentQuery {
    pub fn public() -> Self {
        Self {
            viewer: Viewer::Public,
            scope: ListScope::All,
        }
    }

    pub fn admin() -> Self {
        Self {
            viewer: Viewer::Admin,
            scope: ListScope::All,
        }
    }

    /// Public home page listing.
    pub fn home() -> Self {
        Self {
            viewer: Viewer::Public,
            scope: ListScope::Home,
        }
    }

    pub fn with_scope(mut self, scope: ListScope) -> Self {
        self.scope = scope;
        self
    }

    /// SQL conditions appended after `collection = ?`.
    pub fn sql_conditions(&self) -> String {
        let mut sql = String::new();
        if self.viewer == Viewer::Public {
            sql.push_str(" AND status = '");
            sql.push_str(Status::Published.as_str());
            sql.push('\'');
        }
        if self.scope == ListScope::Home {
            sql.push_str(" AND show_on_home = 1");
        }
        sql
    }

    /// In-memory form of [`sql_conditions`](Self::sql_conditions).
    pub fn permits<D: Document>(&self, doc: &D) -> bool {
        let visibility = doc.visibility();
        if self.viewer == Viewer::Public && !visibility.is_published() {
            return false;
        }
        if self.scope == ListScope::Home && !visibility.show_on_home {
            return false;
        }
        true
    }
}

/// `ORDER BY` clause for listing a collection.
///
/// Display order first; sites then rank by rating, everything else by
/// recency. The id keeps the order total.
pub fn order_clause(collection: Collection) -> &'static str {
    match collection {
        Collection::Sites | Collection::Games => {
            "ORDER BY display_order ASC, rating DESC, created_at DESC, id ASC"
        }
        _ => "ORDER BY display_order ASC, created_at DESC, id ASC",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Page, Visibility};

    fn page(status: Status, show_on_home: bool) -> Page {
        Page {
            slug: "about".to_string(),
            title: "About".to_string(),
            content: String::new(),
            visibility: Visibility {
                status,
                show_on_home,
                ..Visibility::default()
            },
            seo: Default::default(),
        }
    }

    #[test]
    fn test_public_sees_only_published() {
        let query = ContentQuery::public();
        assert!(query.permits(&page(Status::Published, false)));
        assert!(!query.permits(&page(Status::Draft, false)));
        assert!(!query.permits(&page(Status::Archived, false)));
        assert!(!query.permits(&page(Status::Hidden, true)));
    }

    #[test]
    fn test_admin_bypasses_filter() {
        let query = ContentQuery::admin();
        assert!(query.permits(&page(Status::Draft, false)));
        assert!(query.permits(&page(Status::Hidden, false)));
        assert_eq!(query.sql_conditions(), "");
    }

    #[test]
    fn test_home_scope_requires_flag() {
        let query = ContentQuery::home();
        assert!(query.permits(&page(Status::Published, true)));
        assert!(!query.permits(&page(Status::Published, false)));
        assert!(!query.permits(&page(Status::Draft, true)));
        assert_eq!(
            query.sql_conditions(),
            " AND status = 'published' AND show_on_home = 1"
        );
    }

    #[test]
    fn test_order_clause_tiebreaks() {
        assert!(order_clause(Collection::Sites).contains("rating DESC"));
        assert!(order_clause(Collection::Blogs)
            .starts_with("ORDER BY display_order ASC, created_at DESC"));
    }
}
