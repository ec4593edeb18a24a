use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::auth;
use crate::api::users;
use crate::config::Config;
use crate::db::repo;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
}

/// All API traffic lives under the /api prefix. Unmatched paths fall
/// through to axum's 404, which still passes through the CORS layer.
pub fn build_router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/{id}", get(users::show).put(users::update))
        .route("/api/signup", post(auth::signup))
        .route("/api/login", post(auth::login))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Outermost layer so every response carries the cross-origin headers,
/// including 401s, 404s and 500s. An empty allow-list means any origin.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub async fn start_server(config: Config) {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("Failed to connect to SQLite");

    repo::create_user_table(&pool)
        .await
        .expect("Failed to create schema");

    let state = Arc::new(AppState { db: pool });
    let app = build_router(state, &config.allowed_origins);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind");

    tracing::info!(addr = %config.bind_addr, "server listening");

    axum::serve(listener, app).await.expect("Server failed");
}
