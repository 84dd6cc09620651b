//! Detection pipeline: preprocessing, inference and interpretation.

use crate::models::inference::{InferenceEngine, InferenceError};
use crate::models::interpreter::{InterpretError, ScoreInterpreter};
use crate::preprocess::{PreprocessError, Preprocessor};
use crate::types::prediction::{Prediction, PredictionSummary};
use crate::types::scores::ScoreArray;
use thiserror::Error;

/// Any failure between raw bytes and a prediction
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Interpret(#[from] InterpretError),

    #[error("inference task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// True when the request failed only because no model is loaded
    pub fn is_model_unavailable(&self) -> bool {
        matches!(
            self,
            PipelineError::Inference(InferenceError::ModelUnavailable { .. })
        )
    }
}

/// Shared, cheaply clonable pipeline. Holds no per-request state.
#[derive(Debug, Clone)]
pub struct DetectionPipeline {
    preprocessor: Preprocessor,
    engine: InferenceEngine,
    interpreter: ScoreInterpreter,
}

impl DetectionPipeline {
    pub fn new(preprocessor: Preprocessor, engine: InferenceEngine) -> Self {
        Self {
            preprocessor,
            engine,
            interpreter: ScoreInterpreter::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.engine.is_ready()
    }

    /// Fails with the "model not loaded" error in degraded mode
    pub fn ensure_ready(&self) -> Result<(), PipelineError> {
        self.engine.ensure_ready()?;
        Ok(())
    }

    /// Preprocess and run the model on the calling thread
    pub fn scores_blocking(&self, image_bytes: &[u8]) -> Result<ScoreArray, PipelineError> {
        let tensor = self.preprocessor.preprocess(image_bytes)?;
        Ok(self.engine.predict(&tensor)?)
    }

    /// Preprocess and run the model on the blocking thread pool
    pub async fn scores(&self, image_bytes: Vec<u8>) -> Result<ScoreArray, PipelineError> {
        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || pipeline.scores_blocking(&image_bytes)).await?
    }

    /// Label and headline score for an image
    pub async fn summarize(&self, image_bytes: Vec<u8>) -> Result<PredictionSummary, PipelineError> {
        let scores = self.scores(image_bytes).await?;
        Ok(self.interpreter.summarize(&scores)?)
    }

    /// Full interpretation for an image
    pub async fn analyze(&self, image_bytes: Vec<u8>) -> Result<Prediction, PipelineError> {
        let scores = self.scores(image_bytes).await?;
        Ok(self.interpreter.interpret(&scores)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inference::tests::FixedClassifier;
    use crate::models::inference::ModelHandle;
    use crate::preprocess::tests::encode_png;
    use image::{DynamicImage, RgbImage};
    use std::sync::Arc;

    fn pipeline(scores: ScoreArray) -> DetectionPipeline {
        let classifier = Arc::new(FixedClassifier::new(scores));
        DetectionPipeline::new(
            Preprocessor::default(),
            InferenceEngine::new(ModelHandle::Ready(classifier)),
        )
    }

    fn png() -> Vec<u8> {
        encode_png(DynamicImage::ImageRgb8(RgbImage::new(32, 48)))
    }

    #[tokio::test]
    async fn test_summarize_binary() {
        let summary = pipeline(ScoreArray::scalar(0.1)).summarize(png()).await.unwrap();
        assert_eq!(summary.label, "Fire Detected");
    }

    #[tokio::test]
    async fn test_analyze_multiclass() {
        let prediction = pipeline(ScoreArray::distribution(vec![0.25, 0.75]))
            .analyze(png())
            .await
            .unwrap();
        assert_eq!(prediction.label, "class_1");
        assert_eq!(prediction.fire_probability, 25.0);
        assert_eq!(prediction.no_fire_probability, 75.0);
    }

    #[tokio::test]
    async fn test_decode_error_surfaces() {
        let err = pipeline(ScoreArray::scalar(0.1))
            .summarize(b"garbage".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Preprocess(_)));
    }

    #[tokio::test]
    async fn test_unavailable_model() {
        let pipeline = DetectionPipeline::new(
            Preprocessor::default(),
            InferenceEngine::new(ModelHandle::unavailable("model_wildfire.onnx", "missing")),
        );

        assert!(pipeline.ensure_ready().is_err());
        let err = pipeline.analyze(png()).await.unwrap_err();
        assert!(err.is_model_unavailable());
    }
}
