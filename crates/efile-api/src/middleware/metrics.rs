//! # Prometheus Metrics
//!
//! HTTP-level metrics (request counts, latency, errors) are recorded in
//! middleware. Case counters (filings, transitions, lost races, failed
//! allocations) are bumped by the case handlers as outcomes happen.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{
    core::Collector, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts,
    Registry, TextEncoder,
};

use efile_registry::{CaseStage, RegistryError};

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,

    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,

    cases_filed_total: IntCounter,
    stage_transitions_total: IntCounterVec,
    transition_conflicts_total: IntCounter,
    allocation_failures_total: IntCounter,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("errors", &self.errors())
            .field("cases_filed", &self.inner.cases_filed_total.get())
            .finish()
    }
}

impl ApiMetrics {
    /// Create a metrics instance with a fresh Prometheus registry.
    ///
    /// # Errors
    ///
    /// Fails only if a metric definition is rejected by the registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("efile_http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "efile_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "path"],
        )?;

        let http_errors_total = IntCounterVec::new(
            Opts::new("efile_http_errors_total", "Total HTTP errors (4xx and 5xx)"),
            &["method", "path", "status"],
        )?;

        let cases_filed_total = IntCounter::new("efile_cases_filed_total", "Cases filed")?;

        let stage_transitions_total = IntCounterVec::new(
            Opts::new(
                "efile_stage_transitions_total",
                "Committed case stage transitions by target stage",
            ),
            &["to"],
        )?;

        let transition_conflicts_total = IntCounter::new(
            "efile_transition_conflicts_total",
            "Transitions rejected because another writer committed first",
        )?;

        let allocation_failures_total = IntCounter::new(
            "efile_allocation_failures_total",
            "Filings that could not obtain a case number",
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_errors_total.clone()))?;
        registry.register(Box::new(cases_filed_total.clone()))?;
        registry.register(Box::new(stage_transitions_total.clone()))?;
        registry.register(Box::new(transition_conflicts_total.clone()))?;
        registry.register(Box::new(allocation_failures_total.clone()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                http_errors_total,
                cases_filed_total,
                stage_transitions_total,
                transition_conflicts_total,
                allocation_failures_total,
            }),
        })
    }

    /// Return current total request count (sum across all labels).
    pub fn requests(&self) -> u64 {
        sum_counter(&self.inner.http_requests_total)
    }

    /// Return current total error count (sum across all labels).
    pub fn errors(&self) -> u64 {
        sum_counter(&self.inner.http_errors_total)
    }

    /// Count one successful filing.
    pub fn record_filed(&self) {
        self.inner.cases_filed_total.inc();
    }

    /// Count one committed transition into `to`.
    pub fn record_transition(&self, to: CaseStage) {
        self.inner
            .stage_transitions_total
            .with_label_values(&[to.as_str()])
            .inc();
    }

    /// Count registry failures that have a dedicated counter.
    pub fn record_failure(&self, err: &RegistryError) {
        match err {
            RegistryError::ConcurrentModification { .. } => {
                self.inner.transition_conflicts_total.inc()
            }
            RegistryError::AllocationFailed { .. } => self.inner.allocation_failures_total.inc(),
            _ => {}
        }
    }

    /// Record an HTTP request (called by the middleware).
    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();

        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);

        if status >= 400 {
            self.inner
                .http_errors_total
                .with_label_values(&[method, path, &status_str])
                .inc();
        }
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer)
            .map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

fn sum_counter(counter: &IntCounterVec) -> u64 {
    counter
        .collect()
        .iter()
        .flat_map(|mf| mf.get_metric())
        .map(|m| m.get_counter().get_value() as u64)
        .sum()
}

/// Normalize a request path so label cardinality stays bounded.
///
/// UUID segments become `{id}` and purely numeric segments (case number
/// parts) become `{n}`.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.len() == 36
                && segment.chars().enumerate().all(|(i, c)| {
                    if i == 8 || i == 13 || i == 18 || i == 23 {
                        c == '-'
                    } else {
                        c.is_ascii_hexdigit()
                    }
                })
            {
                "{id}"
            } else if segment.len() == 32 && segment.chars().all(|c| c.is_ascii_hexdigit()) {
                "{id}"
            } else if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
                "{n}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Middleware that records HTTP request metrics via Prometheus.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        let duration = start.elapsed().as_secs_f64();
        let status = response.status().as_u16();
        m.record_request(&method, &path, status, duration);
    }

    response
}
