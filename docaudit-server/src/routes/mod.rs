//! Route wiring. All routes are prefixed `/api`.

pub mod query;
pub mod sources;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/sources", post(sources::upload_source))
        .route("/api/sources", get(sources::list_statuses))
        .route("/api/sources", delete(sources::delete_sources))
        .route("/api/sources/{id}", get(sources::get_status))
        .route("/api/sources/{id}", delete(sources::delete_source))
        .route("/api/query", get(query::run_query))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
