//! HTTP handlers for the prediction workflow

use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use shared::{NutrientComparison, SoilFormPatch};

use crate::error::{AppError, AppResult};
use crate::external::ReportedLocation;
use crate::services::WorkflowSnapshot;
use crate::AppState;

/// Coordinates shared by the browser; omitted when location access was denied
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StartWorkflowInput {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Snapshot plus the chart data for the active candidate
#[derive(Debug, Serialize)]
pub struct WorkflowView {
    #[serde(flatten)]
    pub snapshot: WorkflowSnapshot,
    pub nutrient_comparison: Vec<NutrientComparison>,
}

impl From<WorkflowSnapshot> for WorkflowView {
    fn from(snapshot: WorkflowSnapshot) -> Self {
        let nutrient_comparison = snapshot
            .selected_candidate()
            .map(|candidate| candidate.nutrient_comparison())
            .unwrap_or_default();
        Self {
            snapshot,
            nutrient_comparison,
        }
    }
}

impl StartWorkflowInput {
    /// An empty body means location was denied; anything else must be valid JSON
    pub fn from_body(body: &[u8]) -> AppResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| AppError::MalformedBody(e.to_string()))
    }
}

/// Start the workflow and pre-fill weather
pub async fn start_workflow(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<WorkflowView>> {
    let input = StartWorkflowInput::from_body(&body)?;
    let location = ReportedLocation::from_parts(input.latitude, input.longitude);
    let snapshot = state.orchestrator.start(location).await?;
    Ok(Json(snapshot.into()))
}

/// Get the current workflow snapshot
pub async fn get_workflow(State(state): State<AppState>) -> Json<WorkflowView> {
    Json(state.orchestrator.snapshot().into())
}

/// Stream every published snapshot as a `workflow` server-sent event
pub async fn workflow_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let updates = state.orchestrator.subscribe();
    let events = stream::unfold(updates, |mut updates| async move {
        updates.changed().await.ok()?;
        let view = WorkflowView::from(updates.borrow_and_update().clone());
        let event = Event::default().event("workflow").json_data(&view).ok()?;
        Some((Ok(event), updates))
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Update some of the soil form fields
pub async fn update_workflow_input(
    State(state): State<AppState>,
    Json(patch): Json<SoilFormPatch>,
) -> AppResult<Json<WorkflowView>> {
    let snapshot = state.orchestrator.update_input(patch).await?;
    Ok(Json(snapshot.into()))
}

/// Submit the form for prediction
pub async fn submit_workflow(State(state): State<AppState>) -> AppResult<Json<WorkflowView>> {
    let snapshot = state.orchestrator.submit().await?;
    Ok(Json(snapshot.into()))
}

/// Make another candidate the active one
pub async fn select_candidate(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> AppResult<Json<WorkflowView>> {
    let snapshot = state.orchestrator.select_candidate(index).await?;
    Ok(Json(snapshot.into()))
}

/// Back to input for a new submission
pub async fn reset_workflow(State(state): State<AppState>) -> AppResult<Json<WorkflowView>> {
    let snapshot = state.orchestrator.new_cycle().await?;
    Ok(Json(snapshot.into()))
}
