//! HTTP route handlers.

pub mod chat;
pub mod collections;
pub mod documents;
pub mod jobs;
pub mod status;
pub mod web;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(status::routes())
        .merge(documents::routes())
        .merge(collections::routes())
        .merge(web::routes())
        .merge(chat::routes())
        .merge(jobs::routes())
}
