//! Route definitions for the crop advisor API

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/workflow", workflow_routes())
        .nest("/history", history_routes())
}

/// Prediction workflow routes
fn workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_workflow))
        .route("/events", get(handlers::workflow_events))
        .route("/start", post(handlers::start_workflow))
        .route("/input", patch(handlers::update_workflow_input))
        .route("/submit", post(handlers::submit_workflow))
        .route("/select/:index", post(handlers::select_candidate))
        .route("/reset", post(handlers::reset_workflow))
}

/// History and analytics routes
fn history_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_history))
        .route("/refresh", post(handlers::refresh_history))
        .route("/dashboard", get(handlers::get_history_dashboard))
        .route("/export.csv", get(handlers::export_history_csv))
        .route("/:id", delete(handlers::delete_history))
}
