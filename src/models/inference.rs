//! Inference adapter over the loaded classifier

use crate::models::loader::LoadedModel;
use crate::types::scores::ScoreArray;
use crate::types::tensor::ImageTensor;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::debug;

/// Errors raised while running the classifier
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model not loaded on server. Place {model_file} in project folder.")]
    ModelUnavailable { model_file: String },

    #[error("input tensor shape {actual:?} does not match model input shape {expected:?}")]
    ShapeMismatch {
        expected: Vec<i64>,
        actual: [usize; 4],
    },

    #[error("model runtime error: {0}")]
    Runtime(String),

    #[error("model output {name} is not a valid score array (shape {shape:?}, {len} values)")]
    InvalidOutput {
        name: String,
        shape: Vec<i64>,
        len: usize,
    },
}

impl From<ort::Error> for InferenceError {
    fn from(e: ort::Error) -> Self {
        InferenceError::Runtime(e.to_string())
    }
}

/// A model that maps an image tensor to raw scores.
///
/// Implementations must tolerate concurrent calls from request handlers.
pub trait Classifier: Send + Sync {
    /// Model name for logs
    fn name(&self) -> &str;

    /// Input shape the model declares. Negative dimensions are dynamic.
    fn input_shape(&self) -> &[i64];

    /// Run one forward pass
    fn predict(&self, tensor: &ImageTensor) -> Result<ScoreArray, InferenceError>;
}

/// Whether a tensor of shape `actual` fits a declared model input shape.
///
/// Ranks must agree. A negative declared dimension accepts any size.
pub fn accepts_shape(declared: &[i64], actual: &[usize]) -> bool {
    declared.len() == actual.len()
        && declared
            .iter()
            .zip(actual)
            .all(|(&d, &a)| d < 0 || d as usize == a)
}

/// Lock a session, recovering it if an earlier forward pass panicked
pub(crate) fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-wide model state, fixed at startup.
#[derive(Clone)]
pub enum ModelHandle {
    /// A model loaded and ready for inference
    Ready(Arc<dyn Classifier>),
    /// Loading failed; inference requests are rejected
    Unavailable { model_file: String, reason: String },
}

impl ModelHandle {
    pub fn unavailable(model_file: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelHandle::Unavailable {
            model_file: model_file.into(),
            reason: reason.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelHandle::Ready(_))
    }

    /// File name of the missing model, if degraded
    pub fn model_file(&self) -> Option<&str> {
        match self {
            ModelHandle::Ready(_) => None,
            ModelHandle::Unavailable { model_file, .. } => Some(model_file),
        }
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelHandle::Ready(model) => f.debug_tuple("Ready").field(&model.name()).finish(),
            ModelHandle::Unavailable { model_file, reason } => f
                .debug_struct("Unavailable")
                .field("model_file", model_file)
                .field("reason", reason)
                .finish(),
        }
    }
}

/// Runs preprocessed tensors through the shared model handle
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    model: ModelHandle,
}

impl InferenceEngine {
    pub fn new(model: ModelHandle) -> Self {
        Self { model }
    }

    /// Whether a model is loaded
    pub fn is_ready(&self) -> bool {
        self.model.is_ready()
    }

    /// Loaded model name
    pub fn model_name(&self) -> Option<&str> {
        match &self.model {
            ModelHandle::Ready(model) => Some(model.name()),
            ModelHandle::Unavailable { .. } => None,
        }
    }

    /// Fails fast with [`InferenceError::ModelUnavailable`] in degraded mode
    pub fn ensure_ready(&self) -> Result<&Arc<dyn Classifier>, InferenceError> {
        match &self.model {
            ModelHandle::Ready(model) => Ok(model),
            ModelHandle::Unavailable { model_file, .. } => Err(InferenceError::ModelUnavailable {
                model_file: model_file.clone(),
            }),
        }
    }

    /// Run inference on a single-image tensor
    pub fn predict(&self, tensor: &ImageTensor) -> Result<ScoreArray, InferenceError> {
        let model = self.ensure_ready()?;

        let actual = tensor.shape();
        if !accepts_shape(model.input_shape(), &actual) {
            return Err(InferenceError::ShapeMismatch {
                expected: model.input_shape().to_vec(),
                actual,
            });
        }

        let scores = model.predict(tensor)?;

        debug!(
            model = %model.name(),
            output_shape = ?scores.shape(),
            scores = ?scores.first_sample(),
            "Inference complete"
        );

        Ok(scores)
    }
}

impl Classifier for LoadedModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_shape(&self) -> &[i64] {
        &self.input_shape
    }

    fn predict(&self, tensor: &ImageTensor) -> Result<ScoreArray, InferenceError> {
        use ort::value::Tensor;

        let shape: Vec<i64> = tensor.shape().iter().map(|&d| d as i64).collect();
        let input_tensor = Tensor::from_array((shape, tensor.to_vec()))?;

        let mut session = lock_session(&self.session);

        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| InferenceError::Runtime(format!("missing output {}", self.output_name)))?;

        let (shape, data) = output.try_extract_tensor::<f32>()?;
        let dims: Vec<i64> = shape.iter().copied().collect();

        let invalid = || InferenceError::InvalidOutput {
            name: self.output_name.clone(),
            shape: dims.clone(),
            len: data.len(),
        };

        if dims.iter().any(|&d| d < 0) {
            return Err(invalid());
        }
        let usize_dims: Vec<usize> = dims.iter().map(|&d| d as usize).collect();

        ScoreArray::new(usize_dims, data.to_vec()).ok_or_else(invalid)
    }
}
