//! Wildfire Detection Service - Main Entry Point
//!
//! Loads the classifier once at startup and serves the upload, prediction
//! and analysis pages over HTTP. A missing model leaves the pages up and
//! rejects inference.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wildfire_detection::{
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, ServiceMetrics},
    models::{InferenceEngine, ModelLoader},
    pipeline::DetectionPipeline,
    preprocess::Preprocessor,
    storage::UploadStore,
    web::{self, templates::Templates, AppState},
};

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn")
            .add_directive(format!("wildfire_detection={}", logging.level).parse()?),
    };

    if logging.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    init_logging(&config.logging)?;

    info!("Starting Wildfire Detection Service");
    info!(
        model = %config.model.path.display(),
        input_width = config.model.input_width,
        input_height = config.model.input_height,
        uploads_dir = %config.storage.uploads_dir.display(),
        "Configuration loaded successfully"
    );

    // Load the classifier; failure leaves the service in degraded mode
    let handle = ModelLoader::new(&config.model).load_or_degrade();
    if handle.is_ready() {
        info!("Inference enabled");
    } else {
        warn!(
            model = %config.model.path.display(),
            "Running without a model: /predict and /analysis will fail"
        );
    }

    let pipeline = DetectionPipeline::new(
        Preprocessor::new(config.model.input_width, config.model.input_height),
        InferenceEngine::new(handle),
    );

    let store = UploadStore::open(&config.storage.uploads_dir)
        .await
        .context("Failed to create uploads directory")?;

    let templates = Templates::new().context("Failed to compile page templates")?;

    // Initialize metrics
    let metrics = Arc::new(ServiceMetrics::new());
    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let state = Arc::new(AppState {
        pipeline,
        store,
        templates,
        metrics: metrics.clone(),
    });
    let app = web::router(state, config.server.body_limit_bytes);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // Print final summary
    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}
