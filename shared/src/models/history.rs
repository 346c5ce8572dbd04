//! Prediction history models

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::SoilMeasurements;

/// Identifier assigned by the prediction service
pub type RecordId = i64;

/// A persisted past prediction. The remote service owns these; the local
/// copy is replaced wholesale on every fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryRecord {
    pub id: RecordId,
    /// ISO-8601, assigned by the service
    pub timestamp: String,
    pub predicted_crop: String,
    #[serde(flatten)]
    pub inputs: SoilMeasurements,
    #[serde(
        rename = "top_3_crops",
        default,
        deserialize_with = "deserialize_crop_list"
    )]
    pub top3_crops: Vec<String>,
}

impl HistoryRecord {
    /// Calendar date part of the timestamp (`YYYY-MM-DD`).
    ///
    /// Timestamps that do not start with a date fall back to the text before
    /// the `T` separator.
    pub fn calendar_date(&self) -> String {
        self.timestamp
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| {
                self.timestamp
                    .split('T')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CropList {
    List(Vec<String>),
    Joined(String),
}

/// The service has stored the top crops both as a JSON array and as a
/// comma-separated string.
fn deserialize_crop_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let crops = match Option::<CropList>::deserialize(deserializer)? {
        Some(CropList::List(list)) => list,
        Some(CropList::Joined(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|crop| !crop.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    };
    Ok(crops)
}
