//! Interpreted prediction structures

use serde::Serialize;
use std::collections::BTreeMap;

/// Label and headline score, as returned by `/predict`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSummary {
    pub label: String,
    pub score: f64,
}

/// Human-readable view over a score array
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// "Fire Detected", "No Fire" or `class_<k>`
    pub label: String,

    /// Sigmoid score for binary heads, maximum class score otherwise
    pub primary_score: f64,

    /// Per-class probabilities in `[0, 1]`
    pub per_class_probabilities: BTreeMap<String, f64>,

    /// Fire probability as a percentage
    pub fire_probability: f64,

    /// No-fire probability as a percentage
    pub no_fire_probability: f64,
}

impl Prediction {
    /// Headline part of the prediction
    pub fn summary(&self) -> PredictionSummary {
        PredictionSummary {
            label: self.label.clone(),
            score: self.primary_score,
        }
    }

    /// Fire probability rounded to two decimals for display
    pub fn fire_percent_display(&self) -> f64 {
        round2(self.fire_probability)
    }

    /// No-fire probability rounded to two decimals for display
    pub fn no_fire_percent_display(&self) -> f64 {
        round2(self.no_fire_probability)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
