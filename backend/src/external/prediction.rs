//! Prediction Service Client
//!
//! Client for the remote crop prediction service, which is also the system
//! of record for prediction history.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use shared::{HistoryRecord, RecordId, SoilMeasurements};

use super::{HistoryService, PredictionService};
use crate::error::{AppError, AppResult};

/// Client for the prediction service
#[derive(Clone)]
pub struct PredictionApiClient {
    base_url: String,
    http_client: Client,
}

/// Response from POST /predict
#[derive(Debug, Deserialize)]
struct PredictResponse {
    top_3_crops: Vec<String>,
}

/// Response from DELETE /delete-history/{id}
#[derive(Debug, Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    success: bool,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: String,
}

/// The service's own `{error}` message when it sent one, otherwise the
/// status and raw body.
fn service_error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ServiceErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) if body.trim().is_empty() => format!("Service returned {}", status),
        Err(_) => format!("Service returned {}: {}", status, body.trim()),
    }
}

fn check_predictions(response: PredictResponse) -> AppResult<Vec<String>> {
    if response.top_3_crops.is_empty() {
        return Err(AppError::PredictionService(
            "Prediction service returned no crops".to_string(),
        ));
    }
    Ok(response.top_3_crops)
}

fn check_deleted(response: DeleteResponse) -> AppResult<()> {
    if response.success {
        Ok(())
    } else {
        Err(AppError::HistoryService(
            response
                .error
                .unwrap_or_else(|| "Failed to delete record".to_string()),
        ))
    }
}

impl PredictionApiClient {
    /// Create a new prediction service client
    pub fn new(base_url: String) -> AppResult<Self> {
        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_failure(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        service_error_message(status, &body)
    }
}

#[async_trait]
impl PredictionService for PredictionApiClient {
    async fn predict(&self, measurements: &SoilMeasurements) -> AppResult<Vec<String>> {
        let response = self
            .http_client
            .post(format!("{}/predict", self.base_url))
            .json(measurements)
            .send()
            .await
            .map_err(|e| AppError::PredictionService(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::PredictionService(Self::read_failure(response).await));
        }

        let result: PredictResponse = response.json().await.map_err(|e| {
            AppError::PredictionService(format!("Failed to parse response: {}", e))
        })?;

        check_predictions(result)
    }
}

#[async_trait]
impl HistoryService for PredictionApiClient {
    async fn fetch_history(&self) -> AppResult<Vec<HistoryRecord>> {
        let response = self
            .http_client
            .get(format!("{}/history", self.base_url))
            .send()
            .await
            .map_err(|e| AppError::HistoryService(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::HistoryService(Self::read_failure(response).await));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::HistoryService(format!("Failed to parse history: {}", e)))
    }

    async fn delete_history(&self, id: RecordId) -> AppResult<()> {
        let response = self
            .http_client
            .delete(format!("{}/delete-history/{}", self.base_url, id))
            .send()
            .await
            .map_err(|e| AppError::HistoryService(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::HistoryService(Self::read_failure(response).await));
        }

        let result: DeleteResponse = response
            .json()
            .await
            .map_err(|e| AppError::HistoryService(format!("Failed to parse response: {}", e)))?;

        check_deleted(result)
    }
}
