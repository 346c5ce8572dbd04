//! External API integrations
//!
//! Each collaborator sits behind a trait so the workflow can be driven by
//! the HTTP clients in production and by in-memory fakes in tests.

pub mod images;
pub mod location;
pub mod prediction;
pub mod weather;

use async_trait::async_trait;
use shared::{GpsCoordinates, HistoryRecord, RecordId, SoilMeasurements, WeatherConditions};
use thiserror::Error;

use crate::error::AppResult;

pub use images::ImageSearchClient;
pub use location::ReportedLocation;
pub use prediction::PredictionApiClient;
pub use weather::WeatherClient;

/// Best-effort enrichment failed. Never fatal: the workflow leaves the
/// affected field empty and carries on.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Location access denied or failed. Please enter weather details manually.")]
    LocationDenied,

    #[error("Could not fetch local weather: {0}")]
    WeatherUnavailable(String),

    #[error("Could not fetch crop image: {0}")]
    ImageUnavailable(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<GpsCoordinates, EnrichmentError>;
}

#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn current_conditions(
        &self,
        location: GpsCoordinates,
    ) -> Result<WeatherConditions, EnrichmentError>;
}

#[async_trait]
pub trait ImageLookup: Send + Sync {
    /// At most one image URL; `Ok(None)` when the search found nothing
    async fn find_image(&self, crop: &str) -> Result<Option<String>, EnrichmentError>;
}

#[async_trait]
pub trait PredictionService: Send + Sync {
    /// Rank-ordered crop names, best first. The service records the request
    /// in its history as a side effect.
    async fn predict(&self, measurements: &SoilMeasurements) -> AppResult<Vec<String>>;
}

#[async_trait]
pub trait HistoryService: Send + Sync {
    async fn fetch_history(&self) -> AppResult<Vec<HistoryRecord>>;

    /// Ok only when the service acknowledged the deletion
    async fn delete_history(&self, id: RecordId) -> AppResult<()>;
}

/// Stand-in for an enricher whose API key was not configured
#[derive(Debug, Clone, Copy)]
pub struct Unconfigured(pub &'static str);

#[async_trait]
impl WeatherLookup for Unconfigured {
    async fn current_conditions(
        &self,
        _location: GpsCoordinates,
    ) -> Result<WeatherConditions, EnrichmentError> {
        Err(EnrichmentError::NotConfigured(self.0))
    }
}

#[async_trait]
impl ImageLookup for Unconfigured {
    async fn find_image(&self, _crop: &str) -> Result<Option<String>, EnrichmentError> {
        Err(EnrichmentError::NotConfigured(self.0))
    }
}
