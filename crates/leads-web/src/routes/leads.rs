//! Lead entry, listing and inline-edit routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use lead_store::{lead, Lead, LeadEdit, LeadStatus, NewLead};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Largest page a single list request may ask for.
const MAX_LIST_LIMIT: i64 = 1000;

/// Query parameters for listing leads.
#[derive(Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

/// Partial update of one lead.
#[derive(Deserialize)]
pub struct LeadPatch {
    pub status: Option<LeadStatus>,
    pub contact_attempts: Option<i64>,
    pub notes: Option<String>,
}

/// Result of saving the edited table.
#[derive(Serialize)]
pub struct SaveResponse {
    pub updated: u64,
}

/// List the most recent leads.
pub async fn list_api(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Lead>>> {
    let limit = params.limit.unwrap_or(state.stats_window);
    if !(1..=MAX_LIST_LIMIT).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_LIST_LIMIT
        )));
    }

    let leads = lead::list_recent(state.db.pool(), limit).await?;
    Ok(Json(leads))
}

/// Add a lead from the entry form.
pub async fn create_api(
    State(state): State<AppState>,
    Json(candidate): Json<NewLead>,
) -> Result<(StatusCode, Json<Lead>)> {
    let created = lead::create_lead(state.db.pool(), &candidate).await?;
    info!(id = created.id, "Lead added");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Fetch one lead.
pub async fn get_api(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Lead>> {
    let lead = lead::get_lead(state.db.pool(), id).await?;
    Ok(Json(lead))
}

/// Update status, attempts or notes of one lead.
pub async fn update_api(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<LeadPatch>,
) -> Result<Json<Lead>> {
    let edit = LeadEdit {
        id,
        status: patch.status,
        contact_attempts: patch.contact_attempts,
        notes: patch.notes,
    };
    let lead = lead::update_lead(state.db.pool(), &edit).await?;
    Ok(Json(lead))
}

/// Record a contact attempt.
pub async fn contact_api(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Lead>> {
    let lead = lead::record_contact(state.db.pool(), id).await?;
    Ok(Json(lead))
}

/// Save the edited lead table. Only the submitted rows are touched.
pub async fn save_table_api(
    State(state): State<AppState>,
    Json(edits): Json<Vec<LeadEdit>>,
) -> Result<Json<SaveResponse>> {
    let edits: Vec<LeadEdit> = edits.into_iter().filter(|e| !e.is_empty()).collect();
    let updated = lead::apply_edits(state.db.pool(), &edits).await?;
    Ok(Json(SaveResponse { updated }))
}
