//! HTTP server: routes, instrumentation and lifecycle
//!
//! - `/health` - liveness check
//! - `/` - greeting
//! - `/status` - synthetic status codes (extended variant)
//! - `/metrics` - Prometheus scrape (extended variant)

mod lifecycle;
mod metrics;
mod request_log;
mod routes;
mod signal;

pub use lifecycle::{run, Server, ServerError};
pub use metrics::{create_metrics, method_label, RequestMetrics, SharedMetrics, UNKNOWN_METHOD};
pub use request_log::RequestMeta;
pub use routes::{build_router, AppState, STATUS_PARAM};
pub use signal::{spawn_signal_handler, ShutdownSignals, Signal};

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;

#[cfg(test)]
#[path = "metrics_test.rs"]
mod metrics_tests;
