//! Route table
//!
//! - `/health` - liveness, always `OK`
//! - `/` - greeting, request is logged
//! - `/status` - synthetic status code, logged and counted
//! - `/metrics` - Prometheus scrape
//!
//! Paths match exactly and every method reaches the same handler.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use tracing::error;

use super::metrics::{instrument_outcome, SharedMetrics};
use super::request_log::log_request;
use crate::config::Endpoints;
use crate::status::StatusPicker;

/// Query parameter read by `/status`
pub const STATUS_PARAM: &str = "status";

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    picker: Arc<StatusPicker>,
    metrics: SharedMetrics,
}

impl AppState {
    pub fn new(picker: StatusPicker, metrics: SharedMetrics) -> Self {
        Self {
            picker: Arc::new(picker),
            metrics,
        }
    }
}

/// Build the router for the given endpoint variant
pub fn build_router(endpoints: Endpoints, state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", any(health))
        .route("/", any(hello).layer(middleware::from_fn(log_request)));

    if endpoints == Endpoints::Extended {
        // Layers wrap outward: logging runs first, the counter sees the final status
        router = router
            .route(
                "/status",
                any(status)
                    .layer(middleware::from_fn_with_state(
                        state.metrics.clone(),
                        instrument_outcome,
                    ))
                    .layer(middleware::from_fn(log_request)),
            )
            .route("/metrics", any(scrape_metrics));
    }

    router.with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn hello() -> &'static str {
    "Hello World"
}

/// Resolve the first `status` query value through the picker
///
/// A query string that cannot be decoded is treated as absent.
async fn status(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, axum::extract::rejection::QueryRejection>,
) -> StatusCode {
    let params = query.map(|Query(params)| params).unwrap_or_default();
    let requested = params
        .iter()
        .find(|(key, _)| key == STATUS_PARAM)
        .map(|(_, value)| value.as_str());

    state.picker.pick(requested)
}

async fn scrape_metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(body) => (
            [(header::CONTENT_TYPE, state.metrics.content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
