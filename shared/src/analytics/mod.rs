//! Derived views over the prediction history.
//!
//! Everything here is a pure function of a borrowed record slice: nothing
//! performs I/O and nothing mutates the records it reads.

pub mod stats;
pub mod summary;
pub mod table;

pub use stats::*;
pub use summary::*;
pub use table::*;

use serde::{Deserialize, Serialize};

use crate::models::HistoryRecord;
use crate::types::PaginatedResponse;

/// Dashboard request as sent by the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryQuery {
    /// Crop search text
    pub q: String,
    pub sort: SortKey,
    pub direction: SortDirection,
    pub page: usize,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        let sort = SortState::default();
        Self {
            q: String::new(),
            sort: sort.key,
            direction: sort.direction,
            page: 1,
        }
    }
}

impl HistoryQuery {
    pub fn sort_state(&self) -> SortState {
        SortState::new(self.sort, self.direction)
    }
}

/// Every derived view of the history, computed in one pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryDashboard {
    pub sort: SortState,
    pub table: PaginatedResponse<HistoryRecord>,
    pub frequencies: Vec<CropFrequency>,
    pub trend: Vec<TrendPoint>,
    pub outliers: Vec<HistoryRecord>,
    pub nutrient_averages: NutrientAverages,
    pub environment_averages: EnvironmentAverages,
    pub top_crops: Vec<CropFrequency>,
    pub most_frequent: Option<CropFrequency>,
    pub summary: RecommendationSummary,
}

pub fn dashboard(records: &[HistoryRecord], query: &HistoryQuery) -> HistoryDashboard {
    let sort = query.sort_state();
    let frequencies = crop_frequencies(records);
    let nutrient_averages = nutrient_averages(records);
    let environment_averages = environment_averages(records);
    let most_frequent = most_frequent_crop(&frequencies);

    HistoryDashboard {
        sort,
        table: table_page(records, &query.q, sort, query.page),
        trend: trend_series(records),
        outliers: outliers(records).into_iter().cloned().collect(),
        top_crops: top_crops(&frequencies, TOP_CROP_COUNT),
        summary: RecommendationSummary::new(
            most_frequent.clone(),
            &nutrient_averages,
            &environment_averages,
        ),
        frequencies,
        nutrient_averages,
        environment_averages,
        most_frequent,
    }
}

/// Summary on its own, for callers that do not need the full dashboard
pub fn recommendation_summary(records: &[HistoryRecord]) -> RecommendationSummary {
    let frequencies = crop_frequencies(records);
    RecommendationSummary::new(
        most_frequent_crop(&frequencies),
        &nutrient_averages(records),
        &environment_averages(records),
    )
}
