//! Health check handlers

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub prediction_service: String,
    pub weather_prefill: bool,
    pub crop_images: bool,
    pub history_records: usize,
    pub checked_at: DateTime<Utc>,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let history_records = state.orchestrator.history().records().await.len();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        prediction_service: state.config.prediction.base_url.clone(),
        weather_prefill: state.config.weather.api_key.is_some(),
        crop_images: state.config.images.access_key.is_some(),
        history_records,
        checked_at: Utc::now(),
    })
}
