//! Store-backed health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use lead_store::lead;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leads: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Report whether the lead store answers queries.
///
/// Returns 503 when the store is unreachable.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Health>) {
    match lead::count_leads(state.db.pool()).await {
        Ok(count) => (
            StatusCode::OK,
            Json(Health {
                status: "ok",
                leads: Some(count),
                error: None,
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Health {
                    status: "unavailable",
                    leads: None,
                    error: Some(err.to_string()),
                }),
            )
        }
    }
}
