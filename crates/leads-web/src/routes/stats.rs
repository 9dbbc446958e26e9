//! Dashboard statistics.

use axum::extract::State;
use axum::Json;
use lead_store::{stats, LeadStats};

use crate::error::Result;
use crate::state::AppState;

/// Get KPIs for the recent lead window as JSON.
pub async fn stats_api(State(state): State<AppState>) -> Result<Json<LeadStats>> {
    let stats = stats::load(state.db.pool(), state.stats_window).await?;
    Ok(Json(stats))
}
