//! Prediction workflow state machine
//!
//! Sequences weather pre-fill, input completion, prediction, image
//! enrichment and the history refresh. The phase held in the snapshot is the
//! only source of truth for where the workflow is; every change goes through
//! [`WorkflowPhase::can_transition_to`] and is published to subscribers.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use shared::{
    build_candidates, validate_soil_form, CandidateDetailSource, CropCandidate, RecordId,
    SoilForm, SoilFormPatch,
};
use tokio::sync::{watch, Mutex};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::HistoryStore;
use crate::error::{AppError, AppResult};
use crate::external::{Geolocator, ImageLookup, PredictionService, WeatherLookup};

/// Non-terminal stage a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    LocatingWeather,
    AwaitingInput,
    Submitting,
    Enriching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkflowPhase {
    Idle,
    LocatingWeather,
    AwaitingInput,
    Submitting,
    Enriching,
    Ready,
    Failed { stage: WorkflowStage },
}

impl WorkflowPhase {
    fn stage(self) -> Option<WorkflowStage> {
        match self {
            WorkflowPhase::LocatingWeather => Some(WorkflowStage::LocatingWeather),
            WorkflowPhase::AwaitingInput => Some(WorkflowStage::AwaitingInput),
            WorkflowPhase::Submitting => Some(WorkflowStage::Submitting),
            WorkflowPhase::Enriching => Some(WorkflowStage::Enriching),
            WorkflowPhase::Idle | WorkflowPhase::Ready | WorkflowPhase::Failed { .. } => None,
        }
    }

    pub fn can_transition_to(self, next: WorkflowPhase) -> bool {
        use WorkflowPhase::*;

        match (self, next) {
            (Idle, LocatingWeather)
            | (LocatingWeather, AwaitingInput)
            | (AwaitingInput, Submitting)
            | (Submitting, Enriching)
            | (Enriching, Ready)
            | (Ready, AwaitingInput)
            | (Failed { .. }, AwaitingInput) => true,
            (from, Failed { stage }) => from.stage() == Some(stage),
            _ => false,
        }
    }

    /// A prediction is in flight
    pub fn is_busy(self) -> bool {
        matches!(self, WorkflowPhase::Submitting | WorkflowPhase::Enriching)
    }
}

impl fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowPhase::Idle => write!(f, "idle"),
            WorkflowPhase::LocatingWeather => write!(f, "locating_weather"),
            WorkflowPhase::AwaitingInput => write!(f, "awaiting_input"),
            WorkflowPhase::Submitting => write!(f, "submitting"),
            WorkflowPhase::Enriching => write!(f, "enriching"),
            WorkflowPhase::Ready => write!(f, "ready"),
            WorkflowPhase::Failed { stage } => write!(f, "failed({:?})", stage),
        }
    }
}

/// Most recent recoverable failure, kept for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowFailure {
    pub stage: WorkflowStage,
    pub message: String,
}

/// Everything the presentation layer needs to render the workflow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowSnapshot {
    pub phase: WorkflowPhase,
    pub form: SoilForm,
    /// Weather pre-fill was unavailable; the grower has to type those fields
    pub manual_entry_required: bool,
    pub notice: Option<String>,
    /// Rank order as returned by the prediction service
    pub candidates: Vec<CropCandidate>,
    pub selected: Option<usize>,
    pub last_failure: Option<WorkflowFailure>,
    pub submission_id: Option<Uuid>,
}

impl Default for WorkflowSnapshot {
    fn default() -> Self {
        Self {
            phase: WorkflowPhase::Idle,
            form: SoilForm::default(),
            manual_entry_required: false,
            notice: None,
            candidates: Vec::new(),
            selected: None,
            last_failure: None,
            submission_id: None,
        }
    }
}

impl WorkflowSnapshot {
    pub fn selected_candidate(&self) -> Option<&CropCandidate> {
        self.selected.and_then(|index| self.candidates.get(index))
    }

    fn advance(&mut self, next: WorkflowPhase) -> AppResult<()> {
        if !self.phase.can_transition_to(next) {
            return Err(AppError::InvalidStateTransition(format!(
                "{} -> {}",
                self.phase, next
            )));
        }
        info!(from = %self.phase, to = %next, "Workflow transition");
        self.phase = next;
        Ok(())
    }

    /// Back to input, keeping the form but dropping the previous result
    fn begin_new_cycle(&mut self) -> AppResult<()> {
        self.advance(WorkflowPhase::AwaitingInput)?;
        self.candidates.clear();
        self.selected = None;
        self.last_failure = None;
        Ok(())
    }
}

/// External collaborators the workflow drives
pub struct Collaborators {
    pub weather: Arc<dyn WeatherLookup>,
    pub images: Arc<dyn ImageLookup>,
    pub predictions: Arc<dyn PredictionService>,
    pub details: Arc<dyn CandidateDetailSource>,
    pub history: Arc<HistoryStore>,
}

pub struct Orchestrator {
    weather: Arc<dyn WeatherLookup>,
    images: Arc<dyn ImageLookup>,
    predictions: Arc<dyn PredictionService>,
    details: Arc<dyn CandidateDetailSource>,
    history: Arc<HistoryStore>,
    state: Mutex<WorkflowSnapshot>,
    updates: watch::Sender<WorkflowSnapshot>,
}

impl Orchestrator {
    pub fn new(collaborators: Collaborators) -> Self {
        let (updates, _) = watch::channel(WorkflowSnapshot::default());
        Self {
            weather: collaborators.weather,
            images: collaborators.images,
            predictions: collaborators.predictions,
            details: collaborators.details,
            history: collaborators.history,
            state: Mutex::new(WorkflowSnapshot::default()),
            updates,
        }
    }

    /// Last published snapshot; never waits on an in-flight step
    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.updates.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.updates.subscribe()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    fn publish(&self, state: &WorkflowSnapshot) {
        self.updates.send_replace(state.clone());
    }

    /// Locate the device and pre-fill the environmental fields.
    ///
    /// A denied location or failed weather lookup still ends in
    /// `AwaitingInput`, with `manual_entry_required` set.
    pub async fn start<G>(self: &Arc<Self>, locator: G) -> AppResult<WorkflowSnapshot>
    where
        G: Geolocator + 'static,
    {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.locate_weather(locator).await })
            .await
            .map_err(|e| AppError::Internal(format!("Workflow task failed: {}", e)))?
    }

    async fn locate_weather<G: Geolocator>(&self, locator: G) -> AppResult<WorkflowSnapshot> {
        {
            let mut state = self.state.lock().await;
            state.advance(WorkflowPhase::LocatingWeather)?;
            self.publish(&state);
        }

        let conditions = match locator.locate().await {
            Ok(coordinates) => self.weather.current_conditions(coordinates).await,
            Err(err) => Err(err),
        };

        let mut state = self.state.lock().await;
        match conditions {
            Ok(conditions) => {
                info!(?conditions, "Weather pre-filled");
                state.form.fill_weather(&conditions);
                state.manual_entry_required = false;
                state.notice = None;
            }
            Err(err) => {
                warn!(error = %err, "Weather pre-fill unavailable");
                state.manual_entry_required = true;
                state.notice = Some(err.to_string());
            }
        }
        state.advance(WorkflowPhase::AwaitingInput)?;
        self.publish(&state);
        Ok(state.clone())
    }

    /// Merge edited fields into the form. Editing a finished result starts
    /// a new cycle.
    pub async fn update_input(&self, patch: SoilFormPatch) -> AppResult<WorkflowSnapshot> {
        let mut state = self.state.lock().await;
        let phase = state.phase;
        match phase {
            phase if phase.is_busy() => return Err(AppError::Busy),
            WorkflowPhase::LocatingWeather | WorkflowPhase::AwaitingInput => {}
            WorkflowPhase::Ready => state.begin_new_cycle()?,
            other => {
                return Err(AppError::InvalidStateTransition(format!(
                    "cannot edit input while {}",
                    other
                )))
            }
        }
        state.form.apply(patch);
        self.publish(&state);
        Ok(state.clone())
    }

    /// Validate and submit the current form, then enrich the ranked
    /// candidates. Only one submission may be in flight.
    ///
    /// The cycle runs on its own task so that a caller going away cannot
    /// leave the workflow stuck in `Submitting`.
    pub async fn submit(self: &Arc<Self>) -> AppResult<WorkflowSnapshot> {
        let this = Arc::clone(self);
        let submission_id = Uuid::new_v4();
        let span = info_span!("submission", %submission_id);

        tokio::spawn(async move { this.run_submission(submission_id).await }.instrument(span))
            .await
            .map_err(|e| AppError::Internal(format!("Workflow task failed: {}", e)))?
    }

    async fn run_submission(self: Arc<Self>, submission_id: Uuid) -> AppResult<WorkflowSnapshot> {
        let reading = {
            let mut state = self.state.lock().await;
            if state.phase.is_busy() {
                return Err(AppError::Busy);
            }
            if !matches!(state.phase, WorkflowPhase::AwaitingInput | WorkflowPhase::Ready) {
                return Err(AppError::InvalidStateTransition(format!(
                    "cannot submit while {}",
                    state.phase
                )));
            }

            // Rejected input leaves the state exactly as it was
            let reading = validate_soil_form(&state.form)?;

            if state.phase == WorkflowPhase::Ready {
                state.begin_new_cycle()?;
            }
            state.advance(WorkflowPhase::Submitting)?;
            state.submission_id = Some(submission_id);
            state.last_failure = None;
            self.publish(&state);
            reading
        };

        info!(soil_type = %reading.soil_type, "Requesting prediction");
        let crops = match self.predictions.predict(&reading.measurements).await {
            Ok(crops) => crops,
            Err(err) => {
                warn!(error = %err, "Prediction failed");
                self.recover_from_failure(WorkflowStage::Submitting, &err)
                    .await?;
                return Err(err);
            }
        };

        let candidates = build_candidates(self.details.as_ref(), &crops);
        {
            let mut state = self.state.lock().await;
            state.advance(WorkflowPhase::Enriching)?;
            state.selected = (!candidates.is_empty()).then_some(0);
            state.candidates = candidates.clone();
            self.publish(&state);
        }

        let images = join_all(
            candidates
                .iter()
                .map(|candidate| self.lookup_image(&candidate.name)),
        )
        .await;

        let snapshot = {
            let mut state = self.state.lock().await;
            for (candidate, image_url) in state.candidates.iter_mut().zip(images) {
                candidate.image_url = image_url;
            }
            state.advance(WorkflowPhase::Ready)?;
            self.publish(&state);
            state.clone()
        };

        self.spawn_history_refresh();
        Ok(snapshot)
    }

    /// Record the failure, then return to input with the form untouched
    async fn recover_from_failure(&self, stage: WorkflowStage, err: &AppError) -> AppResult<()> {
        let message = match err {
            AppError::PredictionService(message) => message.clone(),
            other => other.to_string(),
        };

        let mut state = self.state.lock().await;
        state.advance(WorkflowPhase::Failed { stage })?;
        state.last_failure = Some(WorkflowFailure { stage, message });
        self.publish(&state);

        state.advance(WorkflowPhase::AwaitingInput)?;
        self.publish(&state);
        Ok(())
    }

    async fn lookup_image(&self, crop: &str) -> Option<String> {
        match self.images.find_image(crop).await {
            Ok(image_url) => image_url,
            Err(err) => {
                warn!(crop, error = %err, "Crop image unavailable");
                None
            }
        }
    }

    fn spawn_history_refresh(&self) {
        let history = Arc::clone(&self.history);
        tokio::spawn(
            async move {
                // Outcome is logged by the store; Ready stands either way
                let _ = history.refresh().await;
            }
            .in_current_span(),
        );
    }

    /// Switch the active candidate; no network involved
    pub async fn select_candidate(&self, index: usize) -> AppResult<WorkflowSnapshot> {
        let mut state = self.state.lock().await;
        if state.phase != WorkflowPhase::Ready {
            return Err(AppError::InvalidStateTransition(format!(
                "no candidates to select while {}",
                state.phase
            )));
        }
        if index >= state.candidates.len() {
            return Err(AppError::InvalidSelection {
                index,
                available: state.candidates.len(),
            });
        }
        state.selected = Some(index);
        self.publish(&state);
        Ok(state.clone())
    }

    /// Leave the result view and go back to input, keeping the form
    pub async fn new_cycle(&self) -> AppResult<WorkflowSnapshot> {
        let mut state = self.state.lock().await;
        let phase = state.phase;
        match phase {
            phase if phase.is_busy() => return Err(AppError::Busy),
            WorkflowPhase::AwaitingInput => {}
            WorkflowPhase::Ready => state.begin_new_cycle()?,
            other => {
                return Err(AppError::InvalidStateTransition(format!(
                    "no result to leave while {}",
                    other
                )))
            }
        }
        self.publish(&state);
        Ok(state.clone())
    }

    pub async fn delete_history(&self, id: RecordId) -> AppResult<()> {
        self.history.delete(id).await
    }
}
