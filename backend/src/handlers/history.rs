//! HTTP handlers for prediction history and analytics

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use shared::analytics::{self, HistoryDashboard, HistoryQuery};
use shared::{HistoryRecord, RecordId};

use crate::error::AppResult;
use crate::AppState;

#[derive(Serialize)]
pub struct DeleteHistoryResponse {
    pub success: bool,
    pub id: RecordId,
}

/// Get the local copy of the history
pub async fn list_history(State(state): State<AppState>) -> Json<Vec<HistoryRecord>> {
    let records = state.orchestrator.history().records().await;
    Json((*records).clone())
}

/// Re-fetch the history from the prediction service
pub async fn refresh_history(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<HistoryRecord>>> {
    let records = state.orchestrator.history().refresh().await?;
    Ok(Json((*records).clone()))
}

/// Delete a history record
pub async fn delete_history(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> AppResult<Json<DeleteHistoryResponse>> {
    state.orchestrator.delete_history(id).await?;
    Ok(Json(DeleteHistoryResponse { success: true, id }))
}

/// Get the analytics dashboard for the history
pub async fn get_history_dashboard(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryDashboard> {
    let records = state.orchestrator.history().records().await;
    Json(analytics::dashboard(&records, &query))
}

/// Export the filtered, sorted history as CSV
pub async fn export_history_csv(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<impl IntoResponse> {
    let records = state.orchestrator.history().records().await;
    let mut rows = analytics::filter_by_crop(&records, &query.q);
    analytics::sort_records(&mut rows, query.sort_state());

    let csv = analytics::export_csv(&rows)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"prediction_history.csv\"",
            ),
        ],
        csv,
    ))
}
