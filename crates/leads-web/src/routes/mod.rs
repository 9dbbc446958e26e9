//! Route handlers for the lead API.

pub mod health;
pub mod import;
pub mod leads;
pub mod stats;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // API endpoints
        .route("/api/leads", get(leads::list_api).post(leads::create_api).put(leads::save_table_api))
        .route("/api/leads/:id", get(leads::get_api).patch(leads::update_api))
        .route("/api/leads/:id/contact", post(leads::contact_api))
        .route("/api/import", post(import::import_api))
        .route("/api/import/preview", post(import::preview_api))
        .route("/api/stats", get(stats::stats_api))
}
