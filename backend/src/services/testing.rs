//! In-memory collaborators for driving the workflow in tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shared::{GpsCoordinates, HistoryRecord, RecordId, SoilMeasurements, WeatherConditions};
use tokio::sync::{Barrier, Notify};

use crate::error::{AppError, AppResult};
use crate::external::{
    EnrichmentError, HistoryService, ImageLookup, PredictionService, WeatherLookup,
};

pub fn history_record(id: RecordId, crop: &str) -> HistoryRecord {
    HistoryRecord {
        id,
        timestamp: format!("2024-06-{:02}T08:30:00", id.clamp(1, 28)),
        predicted_crop: crop.to_string(),
        inputs: SoilMeasurements {
            n: 60.0,
            p: 35.0,
            k: 45.0,
            temperature: 26.0,
            humidity: 70.0,
            ph: 6.4,
            rainfall: 110.0,
        },
        top3_crops: vec![crop.to_string()],
    }
}

pub struct FakeWeather(pub Option<WeatherConditions>);

#[async_trait]
impl WeatherLookup for FakeWeather {
    async fn current_conditions(
        &self,
        _location: GpsCoordinates,
    ) -> Result<WeatherConditions, EnrichmentError> {
        self.0
            .ok_or_else(|| EnrichmentError::WeatherUnavailable("401 Unauthorized".into()))
    }
}

/// Serves `https://img.test/{crop}.jpg` except for crops marked as failing
#[derive(Default)]
pub struct FakeImages {
    failing: HashSet<String>,
    barrier: Option<Arc<Barrier>>,
}

impl FakeImages {
    pub fn failing_for(crop: &str) -> Self {
        Self {
            failing: HashSet::from([crop.to_string()]),
            barrier: None,
        }
    }

    /// Every lookup waits until the barrier's full party has arrived
    pub fn meeting_at(barrier: Arc<Barrier>) -> Self {
        Self {
            failing: HashSet::new(),
            barrier: Some(barrier),
        }
    }
}

#[async_trait]
impl ImageLookup for FakeImages {
    async fn find_image(&self, crop: &str) -> Result<Option<String>, EnrichmentError> {
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if self.failing.contains(crop) {
            return Err(EnrichmentError::ImageUnavailable("rate limited".into()));
        }
        Ok(Some(format!("https://img.test/{}.jpg", crop)))
    }
}

pub struct FakePrediction {
    response: Result<Vec<String>, String>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl FakePrediction {
    pub fn ranking(crops: &[&str]) -> Self {
        Self {
            response: Ok(crops.iter().map(|c| c.to_string()).collect()),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Hold every call until the gate is notified
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionService for FakePrediction {
    async fn predict(&self, _measurements: &SoilMeasurements) -> AppResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.response.clone().map_err(AppError::PredictionService)
    }
}

/// Deletion never removes anything from what later fetches return
pub struct FakeHistory {
    records: Mutex<Vec<HistoryRecord>>,
    fetch_error: Mutex<Option<String>>,
    acknowledge_deletes: bool,
    fetches: AtomicUsize,
    hold: Mutex<Option<Arc<Notify>>>,
}

impl FakeHistory {
    pub fn new(records: Vec<HistoryRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            fetch_error: Mutex::new(None),
            acknowledge_deletes: true,
            fetches: AtomicUsize::new(0),
            hold: Mutex::new(None),
        }
    }

    pub fn rejecting_deletes(mut self) -> Self {
        self.acknowledge_deletes = false;
        self
    }

    pub fn fail_fetches(&self, message: &str) {
        *self.fetch_error.lock().unwrap() = Some(message.to_string());
    }

    /// The next fetch reads the records now but only answers once notified
    pub fn hold_next_fetch(&self, gate: Arc<Notify>) {
        *self.hold.lock().unwrap() = Some(gate);
    }

    pub fn push(&self, record: HistoryRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistoryService for FakeHistory {
    async fn fetch_history(&self) -> AppResult<Vec<HistoryRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fetch_error.lock().unwrap().clone() {
            return Err(AppError::HistoryService(message));
        }
        let records = self.records.lock().unwrap().clone();
        let hold = self.hold.lock().unwrap().take();
        if let Some(gate) = hold {
            gate.notified().await;
        }
        Ok(records)
    }

    async fn delete_history(&self, _id: RecordId) -> AppResult<()> {
        if self.acknowledge_deletes {
            Ok(())
        } else {
            Err(AppError::HistoryService("Failed to delete record".into()))
        }
    }
}
