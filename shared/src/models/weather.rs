//! Weather data models

use serde::{Deserialize, Serialize};

/// Ambient conditions used to pre-fill the environmental part of a reading
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeatherConditions {
    pub temperature_celsius: f64,
    pub humidity_percent: f64,
    /// Rainfall over the last hour, 0 when the provider reports no rain
    pub rainfall_mm: f64,
}
