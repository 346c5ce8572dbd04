//! Crop Advisor - Backend Server
//!
//! Coordinates weather pre-fill, crop prediction and image enrichment for
//! growers, and serves analytics over the prediction history.

use axum::{routing::get, Router};
use shared::RankedEstimate;
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::Instrument;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod routes;
mod services;

pub use config::Config;

use external::{
    ImageLookup, ImageSearchClient, PredictionApiClient, Unconfigured, WeatherClient,
    WeatherLookup,
};
use services::{Collaborators, HistoryStore, Orchestrator};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agro_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting Crop Advisor Server");
    tracing::info!("Environment: {}", config.environment);

    let orchestrator = Arc::new(build_orchestrator(&config)?);

    // Initial history load; the server is usable before it completes
    let initial_history = Arc::clone(&orchestrator);
    tokio::spawn(
        async move {
            let _ = initial_history.history().refresh().await;
        }
        .instrument(tracing::info_span!("initial_history_load")),
    );

    // Create application state
    let state = AppState {
        orchestrator,
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Wire the HTTP collaborators into the workflow. Enrichers without a key
/// degrade to "unavailable" instead of failing startup.
fn build_orchestrator(config: &Config) -> anyhow::Result<Orchestrator> {
    let prediction_client = Arc::new(PredictionApiClient::new(config.prediction.base_url.clone())?);
    tracing::info!("Prediction service at {}", prediction_client.base_url());

    let weather: Arc<dyn WeatherLookup> = match &config.weather.api_key {
        Some(key) => Arc::new(WeatherClient::new(
            key.clone(),
            config.weather.api_endpoint.clone(),
        )),
        None => {
            tracing::warn!("No weather API key configured; growers will enter weather manually");
            Arc::new(Unconfigured("Weather lookup"))
        }
    };

    let images: Arc<dyn ImageLookup> = match &config.images.access_key {
        Some(key) => Arc::new(ImageSearchClient::new(
            key.clone(),
            config.images.api_endpoint.clone(),
        )),
        None => {
            tracing::warn!("No image search key configured; crop images are disabled");
            Arc::new(Unconfigured("Image search"))
        }
    };

    Ok(Orchestrator::new(Collaborators {
        weather,
        images,
        predictions: prediction_client.clone(),
        details: Arc::new(RankedEstimate),
        history: Arc::new(HistoryStore::new(prediction_client)),
    }))
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Crop Advisor API v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
