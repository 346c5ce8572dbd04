//! WebAssembly module for the Crop Advisor
//!
//! Lets the browser compute over the history it already holds:
//! - History dashboard (table page, frequencies, averages, summary)
//! - Outlier check for a single reading
//! - Fertilizer and soil pH advice
//! - Soil form validation before submitting

use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::console;

use shared::analytics::{self, HistoryQuery, NutrientAverages};
use shared::{HistoryRecord, SoilField, SoilForm, SoilMeasurements};

#[derive(Serialize)]
struct FormCheck {
    valid: bool,
    missing: Vec<SoilField>,
    message: Option<String>,
}

fn to_js_error(message: String) -> JsValue {
    console::error_1(&JsValue::from_str(&message));
    js_sys::Error::new(&message).into()
}

fn dashboard_json(records_json: &str, query_json: &str) -> Result<String, String> {
    let records: Vec<HistoryRecord> = serde_json::from_str(records_json)
        .map_err(|e| format!("Invalid history JSON: {}", e))?;
    let query: HistoryQuery = if query_json.trim().is_empty() {
        HistoryQuery::default()
    } else {
        serde_json::from_str(query_json).map_err(|e| format!("Invalid query JSON: {}", e))?
    };

    let dashboard = analytics::dashboard(&records, &query);
    serde_json::to_string(&dashboard).map_err(|e| format!("Failed to encode dashboard: {}", e))
}

fn form_check_json(form_json: &str) -> Result<String, String> {
    let form: SoilForm =
        serde_json::from_str(form_json).map_err(|e| format!("Invalid form JSON: {}", e))?;

    let check = match shared::validate_soil_form(&form) {
        Ok(_) => FormCheck {
            valid: true,
            missing: Vec::new(),
            message: None,
        },
        Err(err) => FormCheck {
            valid: false,
            message: Some(err.to_string()),
            missing: err.missing,
        },
    };
    serde_json::to_string(&check).map_err(|e| format!("Failed to encode result: {}", e))
}

/// Compute every dashboard view over a JSON array of history records.
/// An empty query string means the default view (newest first, page 1).
#[wasm_bindgen]
pub fn history_dashboard(records_json: &str, query_json: &str) -> Result<String, JsValue> {
    dashboard_json(records_json, query_json).map_err(to_js_error)
}

/// Whether a reading would be flagged as an outlier
#[wasm_bindgen]
pub fn is_outlier_reading(n: f64, p: f64, k: f64, temperature: f64, ph: f64) -> bool {
    analytics::is_outlier(&SoilMeasurements {
        n,
        p,
        k,
        temperature,
        ph,
        ..Default::default()
    })
}

/// Fertilizer advice for average N/P/K levels
#[wasm_bindgen]
pub fn fertilizer_advice(n: f64, p: f64, k: f64) -> String {
    analytics::fertilizer_advice(&NutrientAverages { n, p, k }).to_string()
}

/// Soil pH advice for an average pH
#[wasm_bindgen]
pub fn ph_advice(ph: f64) -> String {
    analytics::ph_advice(ph).to_string()
}

/// Check a soil form; returns `{valid, missing, message}` as JSON
#[wasm_bindgen]
pub fn validate_soil_form(form_json: &str) -> Result<String, JsValue> {
    form_check_json(form_json).map_err(to_js_error)
}
