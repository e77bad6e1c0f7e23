pub mod handlers;

use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted JSON request body.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/proxy-api", get(handlers::proxy_api::handle))
        .route("/process-data", post(handlers::data::process_data))
        .route("/api/analyze", post(handlers::analyze::handle))
        .route("/api/normalize", post(handlers::data::normalize_data))
        .route("/api/stats", post(handlers::data::stats))
        .route("/api/sample", get(handlers::sample::handle))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
