//! Request metadata logging for instrumented routes

use axum::{
    extract::{ConnectInfo, Request},
    http::{header, HeaderMap, HeaderName},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use tracing::info;

/// Metadata recorded for every request reaching an instrumented route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMeta {
    pub host: String,
    pub address: String,
    pub method: String,
    pub request_uri: String,
    pub proto: String,
    pub user_agent: String,
}

impl RequestMeta {
    /// Collect metadata without consuming the request
    ///
    /// Missing or non-UTF-8 values become empty strings.
    pub fn from_request(req: &Request) -> Self {
        let host = header_str(req.headers(), header::HOST)
            .or_else(|| req.uri().authority().map(|a| a.as_str().to_string()))
            .unwrap_or_default();

        let address = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_default();

        let request_uri = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.uri().path().to_string());

        Self {
            host,
            address,
            method: req.method().to_string(),
            request_uri,
            proto: format!("{:?}", req.version()),
            user_agent: header_str(req.headers(), header::USER_AGENT).unwrap_or_default(),
        }
    }

    pub fn log(&self) {
        info!(
            host = %self.host,
            address = %self.address,
            method = %self.method,
            request_uri = %self.request_uri,
            proto = %self.proto,
            user_agent = %self.user_agent,
            "Request received"
        );
    }
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Middleware: log request metadata, then run the handler
pub async fn log_request(req: Request, next: Next) -> Response {
    RequestMeta::from_request(&req).log();
    next.run(req).await
}
