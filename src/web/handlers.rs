//! Route handlers

use super::error::{ApiError, PageError};
use super::SharedState;
use crate::metrics::RequestKind;
use crate::storage::StorageError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use std::time::Instant;
use tracing::{error, info, warn};

static DETECT_SCRIPT: &str = include_str!("../../static/js/detect.js");

/// Successful `/predict` response
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub label: String,
    pub score: f64,
    pub image: String,
}

fn render_failed(page: &str, e: tera::Error) -> PageError {
    let e = anyhow::Error::new(e);
    error!(page, error = format!("{:#}", e), "Failed to render page");
    PageError::internal(format!("Error rendering page: {}", e))
}

pub async fn index(State(state): State<SharedState>) -> Result<Html<String>, PageError> {
    state
        .templates
        .home(state.pipeline.is_ready())
        .map(Html)
        .map_err(|e| render_failed("home", e))
}

pub async fn detect(State(state): State<SharedState>) -> Result<Html<String>, PageError> {
    state
        .templates
        .detect(state.pipeline.is_ready())
        .map(Html)
        .map_err(|e| render_failed("detect", e))
}

/// Accept an upload, store it, and classify it
pub async fn predict(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    if let Err(e) = state.pipeline.ensure_ready() {
        state.metrics.record_unavailable();
        warn!("Prediction rejected, model not loaded");
        return Err(ApiError::internal(e.to_string()));
    }

    let mut multipart = multipart.map_err(|e| {
        warn!(error = %e, "Request is not a multipart upload");
        ApiError::bad_request("No file part")
    })?;

    let (filename, bytes) = read_file_field(&mut multipart).await?;

    let saved = state.store.save(&filename, &bytes).await.map_err(|e| match e {
        StorageError::InvalidFilename(_) => {
            warn!(filename = %filename, "Rejected upload filename");
            ApiError::bad_request(e.to_string())
        }
        _ => {
            let e = anyhow::Error::new(e);
            error!(filename = %filename, error = format!("{:#}", e), "Failed to save upload");
            ApiError::internal(e.to_string())
        }
    })?;
    let image = state.store.public_path(&filename);

    let start = Instant::now();
    let result = async {
        let image_bytes = state.store.read(&filename).await?;
        let summary = state.pipeline.summarize(image_bytes).await?;
        anyhow::Ok(summary)
    }
    .await;

    match result {
        Ok(summary) => {
            let elapsed = start.elapsed();
            state
                .metrics
                .record_prediction(RequestKind::Predict, &summary.label, elapsed);
            info!(
                filename = %filename,
                path = %saved.display(),
                label = %summary.label,
                score = summary.score,
                elapsed_us = elapsed.as_micros(),
                "Prediction complete"
            );
            Ok(Json(PredictResponse {
                success: true,
                label: summary.label,
                score: summary.score,
                image,
            }))
        }
        Err(e) => {
            state.metrics.record_failure();
            error!(filename = %filename, error = format!("{:#}", e), "Prediction failed");
            Err(ApiError::internal(e.to_string()))
        }
    }
}

/// Find the `file` part of the form and read it whole
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Vec<u8>), ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(ApiError::bad_request("No file part")),
            Err(e) => {
                warn!(error = %e, status = %e.status(), "Failed to read multipart body");
                return Err(ApiError::new(e.status(), e.body_text()));
            }
        };

        if field.name() != Some("file") {
            continue;
        }
        // A `file` field without a filename is a plain form value, not an upload
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        if filename.is_empty() {
            return Err(ApiError::bad_request("No selected file"));
        }

        let bytes = field.bytes().await.map_err(|e| {
            warn!(filename = %filename, error = %e, status = %e.status(), "Failed to read upload body");
            ApiError::new(e.status(), e.body_text())
        })?;

        return Ok((filename, bytes.to_vec()));
    }
}

/// Re-run the full pipeline on a stored upload and render the breakdown
pub async fn analysis(
    State(state): State<SharedState>,
    Path(filename): Path<String>,
) -> Result<Html<String>, PageError> {
    if !state.store.exists(&filename).await {
        return Err(PageError::not_found());
    }

    let start = Instant::now();
    let result = async {
        let image_bytes = state.store.read(&filename).await?;
        let prediction = state.pipeline.analyze(image_bytes).await?;
        let html = state.templates.analysis(&filename, &prediction)?;
        anyhow::Ok((prediction.label, html))
    }
    .await;

    match result {
        Ok((label, html)) => {
            state
                .metrics
                .record_prediction(RequestKind::Analysis, &label, start.elapsed());
            info!(filename = %filename, label = %label, "Analysis rendered");
            Ok(Html(html))
        }
        Err(e) => {
            state.metrics.record_failure();
            error!(filename = %filename, error = format!("{:#}", e), "Analysis failed");
            Err(PageError::internal(format!("Error analyzing image: {}", e)))
        }
    }
}

/// Serve a stored upload as-is
pub async fn uploaded_file(
    State(state): State<SharedState>,
    Path(filename): Path<String>,
) -> Result<Response, PageError> {
    let bytes = state.store.read(&filename).await.map_err(|e| match e {
        StorageError::NotFound(_) | StorageError::InvalidFilename(_) => PageError::not_found(),
        _ => {
            let e = anyhow::Error::new(e);
            error!(filename = %filename, error = format!("{:#}", e), "Failed to read upload");
            PageError::internal(e.to_string())
        }
    })?;

    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response())
}

pub async fn detect_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        DETECT_SCRIPT,
    )
}

pub async fn health(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "model_loaded": state.pipeline.is_ready(),
    }))
}
