//! Crop recommendation models

use serde::{Deserialize, Serialize};

/// Reference N/P/K levels for a crop
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct NutrientProfile {
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
}

/// Ideal growing conditions used as the comparison baseline
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct IdealConditions {
    pub nutrients: NutrientProfile,
    pub ph: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
}

pub const IDEAL_CONDITIONS: IdealConditions = IdealConditions {
    nutrients: NutrientProfile {
        n: 50.0,
        p: 40.0,
        k: 30.0,
    },
    ph: 6.5,
    temperature: 25.0,
    humidity: 60.0,
    rainfall: 100.0,
};

/// One ranked crop recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropCandidate {
    pub name: String,
    /// Suitability in percent (0-100)
    pub suitability_score: f64,
    /// Expected yield in tons per hectare
    pub expected_yield: f64,
    /// Market price per kg
    pub market_price: f64,
    pub reasons: Vec<String>,
    pub reference_nutrients: NutrientProfile,
    /// Representative picture, absent when the image lookup found nothing
    pub image_url: Option<String>,
}

/// Actual vs ideal level of one nutrient
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NutrientComparison {
    pub parameter: &'static str,
    pub actual: f64,
    pub ideal: f64,
}

impl CropCandidate {
    pub fn nutrient_comparison(&self) -> Vec<NutrientComparison> {
        let actual = self.reference_nutrients;
        let ideal = IDEAL_CONDITIONS.nutrients;
        vec![
            NutrientComparison {
                parameter: "N",
                actual: actual.n,
                ideal: ideal.n,
            },
            NutrientComparison {
                parameter: "P",
                actual: actual.p,
                ideal: ideal.p,
            },
            NutrientComparison {
                parameter: "K",
                actual: actual.k,
                ideal: ideal.k,
            },
        ]
    }
}

/// Supplies the per-candidate details the prediction service does not return.
///
/// The service only ranks crop names; score, yield, price and reasons come
/// from an implementation of this trait so that a real data source can be
/// swapped in without touching the workflow.
pub trait CandidateDetailSource: Send + Sync {
    fn describe(&self, rank: usize, crop: &str) -> CropCandidate;
}

/// Deterministic estimates that decay with rank
#[derive(Debug, Clone, Copy, Default)]
pub struct RankedEstimate;

impl CandidateDetailSource for RankedEstimate {
    fn describe(&self, rank: usize, crop: &str) -> CropCandidate {
        let rank = rank as f64;
        let decay = (1.0 - rank * 0.05).max(0.0);
        let ideal = IDEAL_CONDITIONS.nutrients;

        CropCandidate {
            name: crop.to_string(),
            suitability_score: (90.0 - rank * 10.0).clamp(0.0, 100.0),
            expected_yield: (3.5 - rank * 0.5).max(0.0),
            market_price: (20.0 - rank * 2.0).max(0.0),
            reasons: vec![
                format!("Optimal conditions for {}.", crop),
                "Good nutrient balance.".to_string(),
                "Favorable market outlook.".to_string(),
            ],
            reference_nutrients: NutrientProfile {
                n: ideal.n * decay,
                p: ideal.p * decay,
                k: ideal.k * decay,
            },
            image_url: None,
        }
    }
}

/// Build candidates in the exact order the service ranked them
pub fn build_candidates(source: &dyn CandidateDetailSource, crops: &[String]) -> Vec<CropCandidate> {
    crops
        .iter()
        .enumerate()
        .map(|(rank, crop)| source.describe(rank, crop))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranked_estimate_top_candidate() {
        let candidate = RankedEstimate.describe(0, "Rice");
        assert_eq!(candidate.name, "Rice");
        assert_eq!(candidate.suitability_score, 90.0);
        assert_eq!(candidate.expected_yield, 3.5);
        assert_eq!(candidate.market_price, 20.0);
        assert_eq!(candidate.reasons[0], "Optimal conditions for Rice.");
        assert_eq!(candidate.reference_nutrients, IDEAL_CONDITIONS.nutrients);
        assert!(candidate.image_url.is_none());
    }

    #[test]
    fn test_ranked_estimate_decays_with_rank() {
        let third = RankedEstimate.describe(2, "Cotton");
        assert_eq!(third.suitability_score, 70.0);
        assert_eq!(third.expected_yield, 2.5);
        assert_eq!(third.market_price, 16.0);
        assert!((third.reference_nutrients.n - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_ranked_estimate_never_negative() {
        let far = RankedEstimate.describe(40, "Jute");
        assert_eq!(far.suitability_score, 0.0);
        assert_eq!(far.expected_yield, 0.0);
        assert_eq!(far.reference_nutrients.k, 0.0);
    }

    #[test]
    fn test_build_candidates_preserves_rank_order() {
        let crops = vec!["Rice".to_string(), "Maize".to_string(), "Cotton".to_string()];
        let candidates = build_candidates(&RankedEstimate, &crops);
        let names: Vec<_> = candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Rice", "Maize", "Cotton"]);
    }

    #[test]
    fn test_nutrient_comparison_against_ideal() {
        let comparison = RankedEstimate.describe(1, "Maize").nutrient_comparison();
        assert_eq!(comparison.len(), 3);
        assert_eq!(comparison[1].parameter, "P");
        assert_eq!(comparison[1].ideal, 40.0);
        assert!((comparison[1].actual - 38.0).abs() < 1e-9);
    }
}
