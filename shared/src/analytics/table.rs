//! Filtered, sorted and paginated history table

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::HistoryRecord;
use crate::types::{PaginatedResponse, PaginationMeta};

/// Rows per history table page
pub const PAGE_SIZE: usize = 5;

/// Column the history table can be sorted on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Id,
    PredictedCrop,
    #[serde(rename = "N", alias = "n")]
    N,
    #[serde(rename = "P", alias = "p")]
    P,
    #[serde(rename = "K", alias = "k")]
    K,
    Temperature,
    Humidity,
    Ph,
    Rainfall,
    #[default]
    Timestamp,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    #[default]
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Active sort of the history table. Defaults to newest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Clicking the active column flips the direction, clicking another
    /// column sorts it ascending.
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key == key {
            Self::new(key, self.direction.flipped())
        } else {
            Self::new(key, SortDirection::Ascending)
        }
    }
}

/// Case-insensitive substring match on the predicted crop. An empty query
/// keeps every record, in its original order.
pub fn filter_by_crop<'a>(records: &'a [HistoryRecord], query: &str) -> Vec<&'a HistoryRecord> {
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|record| needle.is_empty() || record.predicted_crop.to_lowercase().contains(&needle))
        .collect()
}

fn compare_by(a: &HistoryRecord, b: &HistoryRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => a.id.cmp(&b.id),
        SortKey::PredictedCrop => a.predicted_crop.cmp(&b.predicted_crop),
        SortKey::N => a.inputs.n.total_cmp(&b.inputs.n),
        SortKey::P => a.inputs.p.total_cmp(&b.inputs.p),
        SortKey::K => a.inputs.k.total_cmp(&b.inputs.k),
        SortKey::Temperature => a.inputs.temperature.total_cmp(&b.inputs.temperature),
        SortKey::Humidity => a.inputs.humidity.total_cmp(&b.inputs.humidity),
        SortKey::Ph => a.inputs.ph.total_cmp(&b.inputs.ph),
        SortKey::Rainfall => a.inputs.rainfall.total_cmp(&b.inputs.rainfall),
        SortKey::Timestamp => a.timestamp.cmp(&b.timestamp),
    }
}

/// Stable single-key sort; equal keys keep their relative order in both
/// directions.
pub fn sort_records(rows: &mut [&HistoryRecord], sort: SortState) {
    rows.sort_by(|a, b| {
        let ordering = compare_by(a, b, sort.key);
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// Slice out one 1-based page. Pages past the end (and page 0) are empty.
pub fn paginate<T: Clone>(rows: &[T], page: usize) -> PaginatedResponse<T> {
    let start = page.saturating_sub(1).saturating_mul(PAGE_SIZE);
    let data = if page == 0 || start >= rows.len() {
        Vec::new()
    } else {
        let end = (start + PAGE_SIZE).min(rows.len());
        rows[start..end].to_vec()
    };

    PaginatedResponse {
        data,
        pagination: PaginationMeta::new(page, PAGE_SIZE, rows.len()),
    }
}

/// Filter, sort and paginate in one go
pub fn table_page(
    records: &[HistoryRecord],
    query: &str,
    sort: SortState,
    page: usize,
) -> PaginatedResponse<HistoryRecord> {
    let mut rows = filter_by_crop(records, query);
    sort_records(&mut rows, sort);
    let page = paginate(&rows, page);

    PaginatedResponse {
        data: page.data.into_iter().cloned().collect(),
        pagination: page.pagination,
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV writer error: {0}")]
    Writer(String),

    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: i64,
    timestamp: &'a str,
    predicted_crop: &'a str,
    #[serde(rename = "N")]
    n: f64,
    #[serde(rename = "P")]
    p: f64,
    #[serde(rename = "K")]
    k: f64,
    temperature: f64,
    humidity: f64,
    ph: f64,
    rainfall: f64,
    top_3_crops: String,
}

const CSV_HEADER: [&str; 11] = [
    "id",
    "timestamp",
    "predicted_crop",
    "N",
    "P",
    "K",
    "temperature",
    "humidity",
    "ph",
    "rainfall",
    "top_3_crops",
];

/// Render table rows as CSV with a header line, even when there are no rows
pub fn export_csv(rows: &[&HistoryRecord]) -> Result<String, ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    wtr.write_record(CSV_HEADER)?;
    for record in rows {
        wtr.serialize(CsvRow {
            id: record.id,
            timestamp: &record.timestamp,
            predicted_crop: &record.predicted_crop,
            n: record.inputs.n,
            p: record.inputs.p,
            k: record.inputs.k,
            temperature: record.inputs.temperature,
            humidity: record.inputs.humidity,
            ph: record.inputs.ph,
            rainfall: record.inputs.rainfall,
            top_3_crops: record.top3_crops.join("; "),
        })?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::Writer(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SoilMeasurements;

    fn record(id: i64, crop: &str, n: f64, timestamp: &str) -> HistoryRecord {
        HistoryRecord {
            id,
            timestamp: timestamp.to_string(),
            predicted_crop: crop.to_string(),
            inputs: SoilMeasurements {
                n,
                ..Default::default()
            },
            top3_crops: vec![crop.to_string()],
        }
    }

    fn sample() -> Vec<HistoryRecord> {
        vec![
            record(1, "Rice", 90.0, "2024-06-01T08:00:00"),
            record(2, "maize", 40.0, "2024-06-03T08:00:00"),
            record(3, "Rice", 40.0, "2024-06-02T08:00:00"),
            record(4, "Cotton", 120.0, "2024-06-04T08:00:00"),
        ]
    }

    fn ids(rows: &[&HistoryRecord]) -> Vec<i64> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let records = sample();
        assert_eq!(ids(&filter_by_crop(&records, "RI")), vec![1, 3]);
        assert_eq!(ids(&filter_by_crop(&records, "aiz")), vec![2]);
        assert_eq!(ids(&filter_by_crop(&records, "")), vec![1, 2, 3, 4]);
        assert!(filter_by_crop(&records, "wheat").is_empty());
    }

    #[test]
    fn test_sort_is_stable_on_equal_keys() {
        let records = sample();
        let mut rows = filter_by_crop(&records, "");

        sort_records(&mut rows, SortState::new(SortKey::N, SortDirection::Ascending));
        assert_eq!(ids(&rows), vec![2, 3, 1, 4]);

        let mut rows = filter_by_crop(&records, "");
        sort_records(&mut rows, SortState::new(SortKey::N, SortDirection::Descending));
        assert_eq!(ids(&rows), vec![4, 1, 2, 3]);
    }

    #[test]
    fn test_sort_by_timestamp_default_is_newest_first() {
        let records = sample();
        let mut rows = filter_by_crop(&records, "");
        sort_records(&mut rows, SortState::default());
        assert_eq!(ids(&rows), vec![4, 2, 3, 1]);
    }

    #[test]
    fn test_toggle_same_key_flips_new_key_resets() {
        let sort = SortState::default().toggle(SortKey::Ph);
        assert_eq!(sort, SortState::new(SortKey::Ph, SortDirection::Ascending));

        let sort = sort.toggle(SortKey::Ph);
        assert_eq!(sort.direction, SortDirection::Descending);

        let sort = sort.toggle(SortKey::Ph);
        assert_eq!(sort.direction, SortDirection::Ascending);

        let sort = sort.toggle(SortKey::Ph).toggle(SortKey::Rainfall);
        assert_eq!(sort, SortState::new(SortKey::Rainfall, SortDirection::Ascending));
    }

    #[test]
    fn test_paginate_bounds() {
        let rows: Vec<u32> = (1..=12).collect();

        let first = paginate(&rows, 1);
        assert_eq!(first.data, vec![1, 2, 3, 4, 5]);
        assert!(first.pagination.has_next);
        assert!(!first.pagination.has_previous);
        assert_eq!(first.pagination.total_pages, 3);

        let last = paginate(&rows, 3);
        assert_eq!(last.data, vec![11, 12]);
        assert!(!last.pagination.has_next);

        assert!(paginate(&rows, 4).data.is_empty());
        assert!(paginate(&rows, 0).data.is_empty());
    }

    #[test]
    fn test_paginate_exact_multiple_has_no_next() {
        let rows: Vec<u32> = (1..=10).collect();
        assert!(!paginate(&rows, 2).pagination.has_next);
    }

    #[test]
    fn test_table_page_combines_steps() {
        let records = sample();
        let page = table_page(
            &records,
            "rice",
            SortState::new(SortKey::Id, SortDirection::Descending),
            1,
        );
        let ids: Vec<_> = page.data.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(page.pagination.total_items, 2);
    }

    #[test]
    fn test_sort_key_query_names() {
        let key: SortKey = serde_json::from_str("\"N\"").unwrap();
        assert_eq!(key, SortKey::N);
        let key: SortKey = serde_json::from_str("\"predicted_crop\"").unwrap();
        assert_eq!(key, SortKey::PredictedCrop);
        let dir: SortDirection = serde_json::from_str("\"asc\"").unwrap();
        assert_eq!(dir, SortDirection::Ascending);
    }

    #[test]
    fn test_export_csv() {
        let records = sample();
        let rows = filter_by_crop(&records, "cotton");
        let csv = export_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("id,timestamp,predicted_crop,N,P,K,temperature,humidity,ph,rainfall,top_3_crops")
        );
        assert!(lines.next().unwrap().starts_with("4,2024-06-04T08:00:00,Cotton,120.0"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_export_csv_without_rows_keeps_header() {
        let csv = export_csv(&[]).unwrap();
        assert_eq!(
            csv,
            "id,timestamp,predicted_crop,N,P,K,temperature,humidity,ph,rainfall,top_3_crops\n"
        );
    }
}
