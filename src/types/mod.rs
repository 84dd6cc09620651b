//! Type definitions for the wildfire detection service

pub mod prediction;
pub mod scores;
pub mod tensor;

pub use prediction::{Prediction, PredictionSummary};
pub use scores::ScoreArray;
pub use tensor::ImageTensor;
