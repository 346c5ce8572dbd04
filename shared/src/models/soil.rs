//! Soil and environment reading models

use serde::{Deserialize, Serialize};

use crate::models::WeatherConditions;

/// Soil texture classes offered to the grower
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SoilType {
    Sandy,
    Loamy,
    Clay,
    Silty,
    Peaty,
    Chalky,
}

impl SoilType {
    pub const ALL: [SoilType; 6] = [
        SoilType::Sandy,
        SoilType::Loamy,
        SoilType::Clay,
        SoilType::Silty,
        SoilType::Peaty,
        SoilType::Chalky,
    ];
}

impl std::fmt::Display for SoilType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SoilType::Sandy => write!(f, "Sandy"),
            SoilType::Loamy => write!(f, "Loamy"),
            SoilType::Clay => write!(f, "Clay"),
            SoilType::Silty => write!(f, "Silty"),
            SoilType::Peaty => write!(f, "Peaty"),
            SoilType::Chalky => write!(f, "Chalky"),
        }
    }
}

impl std::str::FromStr for SoilType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SoilType::ALL
            .into_iter()
            .find(|soil| soil.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown soil type: {}", s))
    }
}

/// The numeric measurements sent to the prediction service and echoed back
/// in every history record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct SoilMeasurements {
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

/// A validated reading, immutable once submitted for prediction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SoilReading {
    #[serde(flatten)]
    pub measurements: SoilMeasurements,
    pub soil_type: SoilType,
}

/// Raw, user-editable form state. Fields hold the text as entered; an empty
/// string means the field has not been filled in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SoilForm {
    #[serde(rename = "N")]
    pub n: String,
    #[serde(rename = "P")]
    pub p: String,
    #[serde(rename = "K")]
    pub k: String,
    pub temperature: String,
    pub humidity: String,
    pub ph: String,
    pub rainfall: String,
    pub soil_type: Option<SoilType>,
}

/// Partial update of a [`SoilForm`]; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilFormPatch {
    #[serde(rename = "N")]
    pub n: Option<String>,
    #[serde(rename = "P")]
    pub p: Option<String>,
    #[serde(rename = "K")]
    pub k: Option<String>,
    pub temperature: Option<String>,
    pub humidity: Option<String>,
    pub ph: Option<String>,
    pub rainfall: Option<String>,
    pub soil_type: Option<SoilType>,
}

impl SoilForm {
    pub fn apply(&mut self, patch: SoilFormPatch) {
        let fields = [
            (&mut self.n, patch.n),
            (&mut self.p, patch.p),
            (&mut self.k, patch.k),
            (&mut self.temperature, patch.temperature),
            (&mut self.humidity, patch.humidity),
            (&mut self.ph, patch.ph),
            (&mut self.rainfall, patch.rainfall),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
        if patch.soil_type.is_some() {
            self.soil_type = patch.soil_type;
        }
    }

    /// Pre-fill the environmental fields the grower has not typed yet
    pub fn fill_weather(&mut self, weather: &WeatherConditions) {
        let fields = [
            (&mut self.temperature, weather.temperature_celsius),
            (&mut self.humidity, weather.humidity_percent),
            (&mut self.rainfall, weather.rainfall_mm),
        ];
        for (field, value) in fields {
            if field.trim().is_empty() {
                *field = format_measurement(value);
            }
        }
    }

    /// True when every environmental field is still blank
    pub fn weather_fields_empty(&self) -> bool {
        [&self.temperature, &self.humidity, &self.rainfall]
            .iter()
            .all(|f| f.trim().is_empty())
    }
}

/// Render a measurement the way it is shown in an input field
pub fn format_measurement(value: f64) -> String {
    value.to_string()
}
