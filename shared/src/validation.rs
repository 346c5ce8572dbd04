//! Validation of grower input before it is submitted for prediction

use serde::Serialize;
use thiserror::Error;

use crate::models::{SoilForm, SoilMeasurements, SoilReading};

/// Fields the grower has to fill in
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum SoilField {
    #[serde(rename = "N")]
    N,
    #[serde(rename = "P")]
    P,
    #[serde(rename = "K")]
    K,
    #[serde(rename = "temperature")]
    Temperature,
    #[serde(rename = "humidity")]
    Humidity,
    #[serde(rename = "ph")]
    Ph,
    #[serde(rename = "rainfall")]
    Rainfall,
    #[serde(rename = "soil_type")]
    SoilType,
}

impl std::fmt::Display for SoilField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SoilField::N => write!(f, "N"),
            SoilField::P => write!(f, "P"),
            SoilField::K => write!(f, "K"),
            SoilField::Temperature => write!(f, "temperature"),
            SoilField::Humidity => write!(f, "humidity"),
            SoilField::Ph => write!(f, "pH"),
            SoilField::Rainfall => write!(f, "rainfall"),
            SoilField::SoilType => write!(f, "soil type"),
        }
    }
}

/// Submission rejected because required input is missing or non-numeric
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("Please fill in all required fields: {}", join_fields(.missing))]
pub struct ValidationError {
    /// In form order: N, P, K, temperature, humidity, pH, rainfall, soil type
    pub missing: Vec<SoilField>,
}

impl ValidationError {
    pub fn names(&self, field: SoilField) -> bool {
        self.missing.contains(&field)
    }
}

fn join_fields(fields: &[SoilField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse one numeric field. Blank, non-numeric and non-finite text is rejected.
pub fn parse_measurement(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Validate the form and produce the normalized reading.
///
/// Every missing field is reported at once, not just the first.
pub fn validate_soil_form(form: &SoilForm) -> Result<SoilReading, ValidationError> {
    let mut missing = Vec::new();
    let mut field = |raw: &str, name: SoilField| {
        let value = parse_measurement(raw);
        if value.is_none() {
            missing.push(name);
        }
        value.unwrap_or_default()
    };

    let measurements = SoilMeasurements {
        n: field(&form.n, SoilField::N),
        p: field(&form.p, SoilField::P),
        k: field(&form.k, SoilField::K),
        temperature: field(&form.temperature, SoilField::Temperature),
        humidity: field(&form.humidity, SoilField::Humidity),
        ph: field(&form.ph, SoilField::Ph),
        rainfall: field(&form.rainfall, SoilField::Rainfall),
    };

    match form.soil_type {
        Some(soil_type) if missing.is_empty() => Ok(SoilReading {
            measurements,
            soil_type,
        }),
        soil_type => {
            if soil_type.is_none() {
                missing.push(SoilField::SoilType);
            }
            Err(ValidationError { missing })
        }
    }
}
