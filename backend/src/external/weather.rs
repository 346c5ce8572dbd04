//! Weather API client for pre-filling environmental conditions
//!
//! Integrates with the OpenWeatherMap current-weather endpoint

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared::{GpsCoordinates, WeatherConditions};

use super::{EnrichmentError, WeatherLookup};

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// OpenWeatherMap API response for current weather
#[derive(Debug, Deserialize)]
struct OWMCurrentResponse {
    main: OWMMain,
    rain: Option<OWMRain>,
}

#[derive(Debug, Deserialize)]
struct OWMMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OWMRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

impl WeatherClient {
    /// Create a new WeatherClient against the given API base URL
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Convert OpenWeatherMap current response to our format
    fn convert_current_response(data: OWMCurrentResponse) -> WeatherConditions {
        WeatherConditions {
            temperature_celsius: data.main.temp,
            humidity_percent: data.main.humidity,
            // OWM omits the rain block when it has not rained
            rainfall_mm: data.rain.and_then(|r| r.one_hour).unwrap_or(0.0),
        }
    }
}

#[async_trait]
impl WeatherLookup for WeatherClient {
    /// Fetch current weather conditions by GPS coordinates
    async fn current_conditions(
        &self,
        location: GpsCoordinates,
    ) -> Result<WeatherConditions, EnrichmentError> {
        let url = format!("{}/weather", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                EnrichmentError::WeatherUnavailable(format!("Weather API request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::WeatherUnavailable(format!(
                "Weather API error: {} - {}",
                status, body
            )));
        }

        let data: OWMCurrentResponse = response.json().await.map_err(|e| {
            EnrichmentError::WeatherUnavailable(format!("Failed to parse weather response: {}", e))
        })?;

        Ok(Self::convert_current_response(data))
    }
}
