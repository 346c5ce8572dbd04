//! Aggregate statistics over the prediction history

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{HistoryRecord, SoilMeasurements};

// Outlier thresholds. Fixed, not configurable.
pub const OUTLIER_NUTRIENT_MAX: f64 = 150.0;
pub const OUTLIER_TEMPERATURE_MAX: f64 = 45.0;
pub const OUTLIER_PH_MAX: f64 = 9.0;
pub const OUTLIER_PH_MIN: f64 = 4.0;

/// How many crops the top-crops view shows
pub const TOP_CROP_COUNT: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CropFrequency {
    pub crop: String,
    pub count: usize,
}

/// One point of the prediction trend chart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendPoint {
    pub date: String,
    pub crop: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct NutrientAverages {
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct EnvironmentAverages {
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

/// Occurrences of each predicted crop over the whole collection, listed in
/// the order each crop first appears.
pub fn crop_frequencies(records: &[HistoryRecord]) -> Vec<CropFrequency> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut frequencies: Vec<CropFrequency> = Vec::new();

    for record in records {
        match index.get(record.predicted_crop.as_str()) {
            Some(&slot) => frequencies[slot].count += 1,
            None => {
                index.insert(&record.predicted_crop, frequencies.len());
                frequencies.push(CropFrequency {
                    crop: record.predicted_crop.clone(),
                    count: 1,
                });
            }
        }
    }

    frequencies
}

/// (date, crop) per record, in record order
pub fn trend_series(records: &[HistoryRecord]) -> Vec<TrendPoint> {
    records
        .iter()
        .map(|record| TrendPoint {
            date: record.calendar_date(),
            crop: record.predicted_crop.clone(),
        })
        .collect()
}

pub fn is_outlier(inputs: &SoilMeasurements) -> bool {
    inputs.n > OUTLIER_NUTRIENT_MAX
        || inputs.p > OUTLIER_NUTRIENT_MAX
        || inputs.k > OUTLIER_NUTRIENT_MAX
        || inputs.temperature > OUTLIER_TEMPERATURE_MAX
        || inputs.ph > OUTLIER_PH_MAX
        || inputs.ph < OUTLIER_PH_MIN
}

pub fn outliers(records: &[HistoryRecord]) -> Vec<&HistoryRecord> {
    records
        .iter()
        .filter(|record| is_outlier(&record.inputs))
        .collect()
}

/// Arithmetic mean, 0 for an empty collection
fn mean(records: &[HistoryRecord], value: impl Fn(&SoilMeasurements) -> f64) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let total: f64 = records.iter().map(|record| value(&record.inputs)).sum();
    total / records.len() as f64
}

pub fn nutrient_averages(records: &[HistoryRecord]) -> NutrientAverages {
    NutrientAverages {
        n: mean(records, |m| m.n),
        p: mean(records, |m| m.p),
        k: mean(records, |m| m.k),
    }
}

pub fn environment_averages(records: &[HistoryRecord]) -> EnvironmentAverages {
    EnvironmentAverages {
        temperature: mean(records, |m| m.temperature),
        humidity: mean(records, |m| m.humidity),
        ph: mean(records, |m| m.ph),
        rainfall: mean(records, |m| m.rainfall),
    }
}

/// Highest counts first; ties keep first-encountered order
pub fn top_crops(frequencies: &[CropFrequency], limit: usize) -> Vec<CropFrequency> {
    let mut ranked = frequencies.to_vec();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

/// The single most predicted crop; the earliest one wins a tie
pub fn most_frequent_crop(frequencies: &[CropFrequency]) -> Option<CropFrequency> {
    frequencies
        .iter()
        .fold(None::<&CropFrequency>, |best, current| match best {
            Some(best) if best.count >= current.count => Some(best),
            _ => Some(current),
        })
        .cloned()
}
