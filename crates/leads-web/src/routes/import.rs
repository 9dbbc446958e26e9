//! CSV upload routes.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use lead_store::import::{self, ImportPlan};
use lead_store::ImportReport;
use tracing::info;

use crate::error::Result;
use crate::state::AppState;

/// Import an uploaded file. The request body is the raw file.
pub async fn import_api(State(state): State<AppState>, body: Bytes) -> Result<Json<ImportReport>> {
    info!(bytes = body.len(), "Importing lead file");

    let report = import::import_leads(state.db.pool(), &body, &state.import).await?;
    Ok(Json(report))
}

/// Classify an uploaded file without inserting anything.
pub async fn preview_api(State(state): State<AppState>, body: Bytes) -> Result<Json<ImportPlan>> {
    let plan = import::preview(state.db.pool(), &body, &state.import).await?;
    Ok(Json(plan))
}
