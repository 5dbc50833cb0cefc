//! Route table.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handler;
use crate::state::AppState;

/// Build the axum router with all DriveDesk endpoints.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(handler::index_handler))
        .route("/health", get(handler::health_handler))
        .nest("/api", api_router())
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(handler::upload_handler))
        .route("/files", get(handler::list_handler))
        .route("/files/export", get(handler::export_handler))
        .route("/archive", get(handler::archive_handler))
        .route("/delete", post(handler::delete_handler))
}
