//! Wildfire Detection Service Library
//!
//! A small web front-end around a pretrained convolutional classifier:
//! upload an image, run a forward pass, and get back fire / no-fire with a
//! probability breakdown.

pub mod config;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod preprocess;
pub mod storage;
pub mod types;
pub mod web;

pub use config::AppConfig;
pub use models::inference::InferenceEngine;
pub use pipeline::DetectionPipeline;
pub use preprocess::Preprocessor;
pub use storage::UploadStore;
pub use types::{Prediction, ScoreArray};
