//! Classifier loading, inference and score interpretation

pub mod inference;
pub mod interpreter;
pub mod loader;

pub use inference::{Classifier, InferenceEngine, InferenceError, ModelHandle};
pub use interpreter::ScoreInterpreter;
pub use loader::ModelLoader;
