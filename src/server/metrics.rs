//! Prometheus metrics for the status endpoint
//!
//! Exposes a single counter family:
//! - `http_requests_total{code, method}` - completed `/status` requests

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use prometheus::core::Collector;
use prometheus::{self, Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Request metrics registry
///
/// Owns its own `Registry` rather than the process-global default one, so
/// every test can build an isolated instance. Clone is cheap (Arc internally).
#[derive(Clone)]
pub struct RequestMetrics {
    registry: Registry,
    /// Total requests by HTTP result code and method
    pub requests_total: IntCounterVec,
}

impl RequestMetrics {
    /// Create a new registry with the request counter registered
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new(
                "requests_total",
                "Total requests by HTTP result code and method.",
            )
            .namespace("http"),
            &["code", "method"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
        })
    }

    /// Record one completed request
    pub fn record_outcome(&self, code: StatusCode, method: &Method) {
        let method = method_label(method);
        self.requests_total
            .with_label_values(&[code.as_str(), method.as_str()])
            .inc();
    }

    /// Current count for a `(code, method)` pair
    ///
    /// Reads from a gathered snapshot so an untouched pair is not created
    /// as a side effect.
    pub fn outcome_count(&self, code: StatusCode, method: &Method) -> u64 {
        let method = method_label(method);
        self.requests_total
            .collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                metric.get_label().iter().all(|pair| match pair.get_name() {
                    "code" => pair.get_value() == code.as_str(),
                    "method" => pair.get_value() == method,
                    _ => true,
                })
            })
            .map(|metric| metric.get_counter().get_value() as u64)
            .unwrap_or(0)
    }

    /// Content type of [`encode`](Self::encode) output
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }

    /// Encode all metrics to Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Failed to encode metrics as UTF-8: {}", e))
        })
    }
}

/// Label value for methods outside the standard set
pub const UNKNOWN_METHOD: &str = "unknown";

/// Method label value
///
/// Standard methods are lower-cased the way the official Prometheus
/// client libraries label them. Extension methods collapse to `unknown`
/// so clients cannot mint new series.
pub fn method_label(method: &Method) -> String {
    match *method {
        Method::GET
        | Method::POST
        | Method::PUT
        | Method::DELETE
        | Method::HEAD
        | Method::OPTIONS
        | Method::PATCH
        | Method::CONNECT
        | Method::TRACE => method.as_str().to_ascii_lowercase(),
        _ => UNKNOWN_METHOD.to_string(),
    }
}

/// Middleware: count the finalized response status of the wrapped route
pub async fn instrument_outcome(
    State(metrics): State<SharedMetrics>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let response = next.run(req).await;
    metrics.record_outcome(response.status(), &method);
    response
}

/// Shared metrics handle for use across the server
pub type SharedMetrics = Arc<RequestMetrics>;

/// Create a new shared metrics instance
pub fn create_metrics() -> Result<SharedMetrics, prometheus::Error> {
    Ok(Arc::new(RequestMetrics::new()?))
}
