//! Request and inference statistics for the detection service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Which pipeline a request went through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// `/predict`: upload, inference, label summary
    Predict,
    /// `/analysis`: re-run on a stored file, full breakdown
    Analysis,
}

impl RequestKind {
    fn as_str(self) -> &'static str {
        match self {
            RequestKind::Predict => "predict",
            RequestKind::Analysis => "analysis",
        }
    }
}

/// Metrics collector for the service
pub struct ServiceMetrics {
    /// Total successful predictions
    pub predictions: AtomicU64,
    /// Total requests that failed inside the pipeline
    pub failures: AtomicU64,
    /// Requests rejected because no model is loaded
    pub rejected_unavailable: AtomicU64,
    /// Successful requests by kind
    requests_by_kind: RwLock<HashMap<RequestKind, u64>>,
    /// Predictions by label
    labels: RwLock<HashMap<String, u64>>,
    /// End-to-end inference times (in microseconds)
    inference_times: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            predictions: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            rejected_unavailable: AtomicU64::new(0),
            requests_by_kind: RwLock::new(HashMap::new()),
            labels: RwLock::new(HashMap::new()),
            inference_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a completed prediction
    pub fn record_prediction(&self, kind: RequestKind, label: &str, elapsed: Duration) {
        self.predictions.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_kind) = self.requests_by_kind.write() {
            *by_kind.entry(kind).or_insert(0) += 1;
        }

        if let Ok(mut labels) = self.labels.write() {
            *labels.entry(label.to_string()).or_insert(0) += 1;
        }

        if let Ok(mut times) = self.inference_times.write() {
            times.push(elapsed.as_micros() as u64);
            // Keep only last 10000
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Record a request that failed after being accepted
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request rejected in degraded mode
    pub fn record_unavailable(&self) {
        self.rejected_unavailable.fetch_add(1, Ordering::Relaxed);
    }

    /// Get inference time statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let times = match self.inference_times.read() {
            Ok(times) => times,
            Err(_) => return LatencyStats::default(),
        };
        if times.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.50),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Get predictions by label
    pub fn get_label_counts(&self) -> HashMap<String, u64> {
        self.labels.read().map(|l| l.clone()).unwrap_or_default()
    }

    /// Get successful requests by kind
    pub fn get_requests_by_kind(&self) -> HashMap<RequestKind, u64> {
        self.requests_by_kind
            .read()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Predictions per second since start
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let predictions = self.predictions.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);
        let unavailable = self.rejected_unavailable.load(Ordering::Relaxed);
        let latency = self.get_latency_stats();

        info!(
            predictions,
            failures,
            rejected_unavailable = unavailable,
            throughput = format!("{:.2} req/s", self.get_throughput()),
            "Service metrics"
        );

        if latency.count > 0 {
            info!(
                mean_us = latency.mean_us,
                p50_us = latency.p50_us,
                p95_us = latency.p95_us,
                p99_us = latency.p99_us,
                max_us = latency.max_us,
                "Inference latency"
            );
        }

        for (kind, count) in self.get_requests_by_kind() {
            info!(kind = kind.as_str(), count, "Requests by kind");
        }

        for (label, count) in self.get_label_counts() {
            let pct = if predictions > 0 {
                (count as f64 / predictions as f64) * 100.0
            } else {
                0.0
            };
            info!(label = %label, count, share = format!("{:.1}%", pct), "Predictions by label");
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Inference time statistics
#[derive(Debug, Default)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodically logs a metrics summary
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
