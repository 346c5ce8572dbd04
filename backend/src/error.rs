//! Error handling for the crop advisor server
//!
//! Every failure resolves to a recoverable workflow state; this type is what
//! gets reported back to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::analytics::ExportError;
use shared::{SoilField, ValidationError};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No crop candidate at position {index} ({available} available)")]
    InvalidSelection { index: usize, available: usize },

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    // Workflow errors
    #[error("A prediction is already in progress")]
    Busy,

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    // Remote service errors, message passed through
    #[error("Prediction failed: {0}")]
    PredictionService(String),

    #[error("History service error: {0}")]
    HistoryService(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<SoilField>>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InvalidSelection { .. }
            | AppError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            AppError::Busy | AppError::InvalidStateTransition(_) => StatusCode::CONFLICT,
            AppError::PredictionService(_) | AppError::HistoryService(_) => StatusCode::BAD_GATEWAY,
            AppError::Configuration(_) | AppError::Export(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidSelection { .. } => "INVALID_SELECTION",
            AppError::MalformedBody(_) => "MALFORMED_BODY",
            AppError::Busy => "PREDICTION_IN_PROGRESS",
            AppError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            AppError::PredictionService(_) => "PREDICTION_SERVICE_ERROR",
            AppError::HistoryService(_) => "HISTORY_SERVICE_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Export(_) => "EXPORT_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let fields = match &self {
            AppError::Validation(err) => Some(err.missing.clone()),
            _ => None,
        };
        let message = match &self {
            // Do not leak internals
            AppError::Internal(_) => "An internal server error occurred".to_string(),
            other => other.to_string(),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
                fields,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
