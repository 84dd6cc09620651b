//! Score interpretation: raw model output to human-readable labels

use crate::types::prediction::{Prediction, PredictionSummary};
use crate::types::scores::{ScoreArray, ScoreKind};
use std::collections::BTreeMap;
use thiserror::Error;

/// Label for a sigmoid score at or below [`FIRE_THRESHOLD`]
pub const FIRE_LABEL: &str = "Fire Detected";

/// Label for a sigmoid score above [`FIRE_THRESHOLD`]
pub const NO_FIRE_LABEL: &str = "No Fire";

/// Sigmoid boundary. Lower scores mean fire; the boundary itself is fire.
pub const FIRE_THRESHOLD: f64 = 0.5;

/// Errors raised while interpreting scores
#[derive(Debug, Error, PartialEq)]
pub enum InterpretError {
    #[error("model returned an empty score array")]
    EmptyScores,
}

/// Maps score arrays to labels and probabilities.
///
/// Binary heads: a single sigmoid score `s`, fire when `s <= 0.5`.
///
/// Multi-class heads: `class_<argmax>`, lowest index wins ties. The display
/// breakdown reads index 0 as fire and index 1 as no fire. That class
/// mapping has never been checked against the training labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreInterpreter;

impl ScoreInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Label and headline score only, as `/predict` reports them
    pub fn summarize(&self, scores: &ScoreArray) -> Result<PredictionSummary, InterpretError> {
        match scores.kind().ok_or(InterpretError::EmptyScores)? {
            ScoreKind::Binary => {
                let s = scores.first_sample()[0] as f64;
                Ok(PredictionSummary {
                    label: binary_label(s).to_string(),
                    score: s,
                })
            }
            ScoreKind::MultiClass => {
                let sample = scores.first_sample();
                let idx = argmax(sample);
                Ok(PredictionSummary {
                    label: class_label(idx),
                    score: sample[idx] as f64,
                })
            }
        }
    }

    /// Full interpretation with per-class probabilities
    pub fn interpret(&self, scores: &ScoreArray) -> Result<Prediction, InterpretError> {
        match scores.kind().ok_or(InterpretError::EmptyScores)? {
            ScoreKind::Binary => Ok(interpret_binary(scores.first_sample()[0] as f64)),
            ScoreKind::MultiClass => Ok(interpret_multiclass(scores.first_sample())),
        }
    }
}

fn binary_label(score: f64) -> &'static str {
    if score <= FIRE_THRESHOLD {
        FIRE_LABEL
    } else {
        NO_FIRE_LABEL
    }
}

fn class_label(idx: usize) -> String {
    format!("class_{}", idx)
}

/// Index of the first maximum
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

fn interpret_binary(score: f64) -> Prediction {
    let mut per_class = BTreeMap::new();
    per_class.insert("fire".to_string(), 1.0 - score);
    per_class.insert("no_fire".to_string(), score);

    Prediction {
        label: binary_label(score).to_string(),
        primary_score: score,
        per_class_probabilities: per_class,
        fire_probability: (1.0 - score) * 100.0,
        no_fire_probability: score * 100.0,
    }
}

fn interpret_multiclass(probs: &[f32]) -> Prediction {
    let idx = argmax(probs);

    let per_class = probs
        .iter()
        .enumerate()
        .map(|(i, &p)| (class_label(i), p as f64))
        .collect();

    // Index 0 = fire, index 1 = no fire: unverified
    let fire_probability = probs[0] as f64 * 100.0;
    let no_fire_probability = probs.get(1).map(|&p| p as f64 * 100.0).unwrap_or(0.0);

    Prediction {
        label: class_label(idx),
        primary_score: probs[idx] as f64,
        per_class_probabilities: per_class,
        fire_probability,
        no_fire_probability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpret(scores: ScoreArray) -> Prediction {
        ScoreInterpreter::new().interpret(&scores).unwrap()
    }

    #[test]
    fn test_binary_labels_across_range() {
        for i in 0..=100 {
            let s = i as f32 / 100.0;
            let prediction = interpret(ScoreArray::scalar(s));
            let expected = if (s as f64) <= 0.5 { FIRE_LABEL } else { NO_FIRE_LABEL };
            assert_eq!(prediction.label, expected, "score {s}");
        }
    }

    #[test]
    fn test_binary_probabilities_sum_to_100() {
        for i in 0..=1000 {
            let s = i as f32 / 1000.0;
            let prediction = interpret(ScoreArray::scalar(s));
            let total = prediction.fire_probability + prediction.no_fire_probability;
            assert!((total - 100.0).abs() < 1e-9, "score {s}: {total}");
        }
    }

    #[test]
    fn test_binary_boundary_is_fire() {
        let prediction = interpret(ScoreArray::scalar(0.5));

        assert_eq!(prediction.label, FIRE_LABEL);
        assert_eq!(prediction.fire_probability, 50.0);
        assert_eq!(prediction.no_fire_probability, 50.0);
    }

    #[test]
    fn test_binary_just_above_boundary() {
        let prediction = interpret(ScoreArray::scalar(0.5001));
        assert_eq!(prediction.label, NO_FIRE_LABEL);
    }

    #[test]
    fn test_binary_per_class_map() {
        let prediction = interpret(ScoreArray::scalar(0.25));

        assert_eq!(prediction.primary_score, 0.25);
        assert_eq!(prediction.per_class_probabilities["fire"], 0.75);
        assert_eq!(prediction.per_class_probabilities["no_fire"], 0.25);
        assert_eq!(prediction.fire_probability, 75.0);
    }

    #[test]
    fn test_multiclass_argmax() {
        let prediction = interpret(ScoreArray::distribution(vec![0.1, 0.2, 0.7]));

        assert_eq!(prediction.label, "class_2");
        assert!((prediction.primary_score - 0.7).abs() < 1e-6);
        assert_eq!(prediction.per_class_probabilities.len(), 3);
    }

    #[test]
    fn test_multiclass_tie_prefers_lowest_index() {
        let prediction = interpret(ScoreArray::distribution(vec![0.5, 0.5]));
        assert_eq!(prediction.label, "class_0");

        let prediction = interpret(ScoreArray::distribution(vec![0.2, 0.4, 0.4]));
        assert_eq!(prediction.label, "class_1");
    }

    /// Index 0 is read as fire and index 1 as no fire. The mapping is an
    /// unverified assumption; this test pins it rather than endorsing it.
    #[test]
    fn test_multiclass_display_assumes_class0_is_fire() {
        let prediction = interpret(ScoreArray::distribution(vec![0.8, 0.2]));

        assert_eq!(prediction.label, "class_0");
        assert!((prediction.fire_probability - 80.0).abs() < 1e-4);
        assert!((prediction.no_fire_probability - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_multiclass_uses_first_sample_only() {
        let scores = ScoreArray::new(vec![2, 2], vec![0.9, 0.1, 0.0, 1.0]).unwrap();
        let prediction = interpret(scores);
        assert_eq!(prediction.label, "class_0");
    }

    #[test]
    fn test_summary_matches_interpretation() {
        let interpreter = ScoreInterpreter::new();

        let binary = ScoreArray::scalar(0.3);
        let summary = interpreter.summarize(&binary).unwrap();
        assert_eq!(summary.label, FIRE_LABEL);
        assert!((summary.score - 0.3).abs() < 1e-6);

        let multi = ScoreArray::distribution(vec![0.1, 0.6, 0.3]);
        let summary = interpreter.summarize(&multi).unwrap();
        assert_eq!(summary.label, "class_1");
        assert!((summary.score - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_empty_scores() {
        let scores = ScoreArray::new(vec![1, 0], vec![]).unwrap();
        assert_eq!(
            ScoreInterpreter::new().interpret(&scores),
            Err(InterpretError::EmptyScores)
        );
    }
}
