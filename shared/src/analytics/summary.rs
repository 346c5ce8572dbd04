//! Rule-based recommendation summary

use serde::{Deserialize, Serialize};

use super::stats::{CropFrequency, EnvironmentAverages, NutrientAverages};

pub const NITROGEN_FLOOR: f64 = 50.0;
pub const PHOSPHORUS_FLOOR: f64 = 30.0;
pub const POTASSIUM_FLOOR: f64 = 40.0;
pub const ACIDIC_PH_BELOW: f64 = 5.5;
pub const ALKALINE_PH_ABOVE: f64 = 7.5;

pub const GENERAL_RECOMMENDATION: &str = "Maintain balanced soil nutrients and monitor \
environmental conditions regularly to optimize crop yield.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FertilizerAdvice {
    NitrogenRich,
    PhosphorusRich,
    PotassiumRich,
    Balanced,
}

impl std::fmt::Display for FertilizerAdvice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FertilizerAdvice::NitrogenRich => write!(f, "Apply Nitrogen-rich fertilizer."),
            FertilizerAdvice::PhosphorusRich => write!(f, "Apply Phosphorus-rich fertilizer."),
            FertilizerAdvice::PotassiumRich => write!(f, "Apply Potassium-rich fertilizer."),
            FertilizerAdvice::Balanced => write!(f, "Nutrient levels are balanced."),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SoilPhAdvice {
    Acidic,
    Alkaline,
    Optimal,
}

impl std::fmt::Display for SoilPhAdvice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SoilPhAdvice::Acidic => {
                write!(f, "Soil is acidic. Consider adding lime to raise pH.")
            }
            SoilPhAdvice::Alkaline => {
                write!(f, "Soil is alkaline. Consider adding sulfur to lower pH.")
            }
            SoilPhAdvice::Optimal => write!(f, "Soil pH is optimal."),
        }
    }
}

/// First matching rule wins: N, then P, then K
pub fn fertilizer_advice(averages: &NutrientAverages) -> FertilizerAdvice {
    if averages.n < NITROGEN_FLOOR {
        FertilizerAdvice::NitrogenRich
    } else if averages.p < PHOSPHORUS_FLOOR {
        FertilizerAdvice::PhosphorusRich
    } else if averages.k < POTASSIUM_FLOOR {
        FertilizerAdvice::PotassiumRich
    } else {
        FertilizerAdvice::Balanced
    }
}

pub fn ph_advice(average_ph: f64) -> SoilPhAdvice {
    if average_ph < ACIDIC_PH_BELOW {
        SoilPhAdvice::Acidic
    } else if average_ph > ALKALINE_PH_ABOVE {
        SoilPhAdvice::Alkaline
    } else {
        SoilPhAdvice::Optimal
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationSummary {
    pub top_crop: Option<CropFrequency>,
    pub top_crop_message: String,
    pub fertilizer: FertilizerAdvice,
    pub fertilizer_message: String,
    pub soil_ph: SoilPhAdvice,
    pub soil_ph_message: String,
    pub environment_message: String,
    pub general_message: String,
}

impl RecommendationSummary {
    pub fn new(
        top_crop: Option<CropFrequency>,
        nutrients: &NutrientAverages,
        environment: &EnvironmentAverages,
    ) -> Self {
        let top_crop_message = match &top_crop {
            Some(top) => format!("{} (predicted {} times)", top.crop, top.count),
            None => "No crop prediction data available.".to_string(),
        };
        let fertilizer = fertilizer_advice(nutrients);
        let soil_ph = ph_advice(environment.ph);

        Self {
            top_crop,
            top_crop_message,
            fertilizer,
            fertilizer_message: fertilizer.to_string(),
            soil_ph,
            soil_ph_message: soil_ph.to_string(),
            environment_message: format!(
                "The average temperature is {:.1}°C, humidity is {:.1}%, and average rainfall is {:.1} mm.",
                environment.temperature, environment.humidity, environment.rainfall
            ),
            general_message: GENERAL_RECOMMENDATION.to_string(),
        }
    }
}
