//! ONNX model loader

use crate::config::ModelConfig;
use crate::models::inference::{accepts_shape, Classifier, ModelHandle};
use anyhow::{bail, Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::ValueType;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name
    pub name: String,
    /// ONNX Runtime session, exclusive while a forward pass runs
    pub session: Mutex<Session>,
    /// Input name for the model
    pub input_name: String,
    /// Output name for the scores
    pub output_name: String,
    /// Input shape declared by the model, `-1` for dynamic dimensions
    pub input_shape: Vec<i64>,
}

/// Loader for the classifier model
pub struct ModelLoader {
    /// ONNX model file
    path: PathBuf,
    /// File name of the model, used in operator-facing messages
    model_file: String,
    /// Number of threads for ONNX inference
    onnx_threads: usize,
    /// Shape of the tensors the preprocessor produces, `[1, height, width, 3]`
    tensor_shape: [usize; 4],
}

impl ModelLoader {
    /// Create a loader from model configuration
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            path: config.path.clone(),
            model_file: config.file_name(),
            onnx_threads: config.onnx_threads.max(1),
            tensor_shape: [
                1,
                config.input_height as usize,
                config.input_width as usize,
                3,
            ],
        }
    }

    /// Load the configured ONNX model.
    ///
    /// Fails when the model's declared input cannot take the tensors the
    /// preprocessor produces.
    pub fn load_model(&self) -> Result<LoadedModel> {
        let name = self.model_file.clone();

        info!(model = %name, path = %self.path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(&self.path)
            .context(format!("Failed to load model from {:?}", self.path))?;

        let input = session.inputs.first().context("Model declares no inputs")?;
        let input_name = input.name.clone();
        let input_shape: Vec<i64> = match &input.input_type {
            ValueType::Tensor { shape, .. } => shape.iter().copied().collect(),
            _ => bail!("Model input {} is not a tensor", input_name),
        };

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .context("Model declares no outputs")?;

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            input_shape = ?input_shape,
            "Model loaded successfully"
        );

        if !accepts_shape(&input_shape, &self.tensor_shape) {
            bail!(
                "Model input shape {:?} does not accept {:?} tensors; check model.input_width and model.input_height",
                input_shape,
                self.tensor_shape
            );
        }

        Ok(LoadedModel {
            name,
            session: Mutex::new(session),
            input_name,
            output_name,
            input_shape,
        })
    }

    /// Load the configured model, falling back to degraded mode on any failure.
    ///
    /// Never fails: a missing, unreadable or incompatible artifact yields
    /// [`ModelHandle::Unavailable`] and the service keeps serving pages.
    pub fn load_or_degrade(&self) -> ModelHandle {
        let model_file = self.model_file.clone();

        if !self.path.exists() {
            let cwd = std::env::current_dir()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default();
            warn!(
                path = %self.path.display(),
                cwd = %cwd,
                "Model file not found, inference disabled"
            );
            return ModelHandle::unavailable(model_file, "model file not found");
        }

        match self.load_model() {
            Ok(model) => ModelHandle::Ready(Arc::new(model) as Arc<dyn Classifier>),
            Err(e) => {
                error!(
                    path = %self.path.display(),
                    error = format!("{:#}", e),
                    "Model load failed, inference disabled"
                );
                ModelHandle::unavailable(model_file, format!("{:#}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_model_degrades() {
        let config = ModelConfig {
            path: "no/such/model.onnx".into(),
            ..ModelConfig::default()
        };

        let handle = ModelLoader::new(&config).load_or_degrade();
        assert!(!handle.is_ready());
        assert_eq!(handle.model_file(), Some("model.onnx"));
    }

    #[test]
    fn test_corrupt_model_degrades() {
        let mut file = tempfile::Builder::new().suffix(".onnx").tempfile().unwrap();
        file.write_all(b"this is not a protobuf graph").unwrap();

        let config = ModelConfig {
            path: file.path().to_path_buf(),
            ..ModelConfig::default()
        };

        let handle = ModelLoader::new(&config).load_or_degrade();
        assert!(!handle.is_ready());
    }

    #[test]
    fn test_tensor_shape_from_config() {
        let config = ModelConfig {
            input_width: 128,
            input_height: 96,
            ..ModelConfig::default()
        };
        let loader = ModelLoader::new(&config);
        assert_eq!(loader.tensor_shape, [1, 96, 128, 3]);
        assert_eq!(loader.model_file, "model_wildfire.onnx");
    }
}
