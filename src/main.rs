//! Affiliate CMS Backend
//!
//! Server-rendered review site with ad targeting, plus an authenticated admin
//! API over a SQLite content store and a Tantivy search index.

mod ads;
mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod permissions;
mod search;
mod slug;
mod visibility;
mod web;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::{ContentStore, Repository};
use search::SearchIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Affiliate CMS Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // The pool itself is opened on first use
    let repo = Arc::new(Repository::new(ContentStore::new(&config.db_path)));

    let bootstrapped = auth::bootstrap_super_admin(&repo, &config).await?;
    if bootstrapped.is_none() && repo.count_users().await? == 0 {
        tracing::warn!(
            "No users exist and CMS_BOOTSTRAP_EMAIL/CMS_BOOTSTRAP_PASSWORD are not set; \
             the admin API is unusable"
        );
    }

    // Initialize search index
    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    tracing::info!("Building search index...");
    search.rebuild(&repo).await?;

    // Create application state
    let state = AppState {
        repo,
        search,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Auth
        .route("/api/auth/login", post(api::login))
        .route("/api/auth/logout", post(api::logout))
        .route("/api/auth/me", get(api::me))
        // Users
        .route("/api/admin/users", get(api::list_users).post(api::create_user))
        .route(
            "/api/admin/users/{id}",
            get(api::get_user)
                .put(api::update_user)
                .delete(api::delete_user),
        )
        // Home page
        .route(
            "/api/admin/home-page",
            get(api::get_home_page)
                .post(api::create_home_page)
                .put(api::update_home_page),
        )
        // Content collections
        .merge(api::content_routes())
        // Public JSON
        .route("/api/ads", get(api::list_ads))
        .route("/api/search", get(api::search_content));

    // Health check and public pages
    let site_routes = Router::new()
        .route("/health", get(health_check))
        .route("/", get(web::home))
        .route("/{slug}", get(web::show))
        .fallback(web::fallback);

    Router::new()
        .merge(api_routes)
        .merge(site_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
