//! Application state shared across handlers.

use std::sync::Arc;

use lead_store::{Database, ImportOptions};

use crate::config::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Lead store.
    pub db: Database,
    /// CSV import settings.
    pub import: Arc<ImportOptions>,
    /// Recent leads listed and used for statistics.
    pub stats_window: i64,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, config: &Config) -> Self {
        Self {
            db,
            import: Arc::new(config.import.clone()),
            stats_window: config.stats_window,
        }
    }
}
