//! HTTP front-end

pub mod error;
pub mod handlers;
pub mod templates;

use crate::metrics::ServiceMetrics;
use crate::pipeline::DetectionPipeline;
use crate::storage::UploadStore;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use templates::Templates;

/// State shared by every request handler
pub struct AppState {
    pub pipeline: DetectionPipeline,
    pub store: UploadStore,
    pub templates: Templates,
    pub metrics: Arc<ServiceMetrics>,
}

pub type SharedState = Arc<AppState>;

/// Build the service router
pub fn router(state: SharedState, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/detect", get(handlers::detect))
        .route("/predict", post(handlers::predict))
        .route("/analysis/:filename", get(handlers::analysis))
        .route("/uploads/:filename", get(handlers::uploaded_file))
        .route("/static/uploads/:filename", get(handlers::uploaded_file))
        .route("/static/js/detect.js", get(handlers::detect_script))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .with_state(state)
}
