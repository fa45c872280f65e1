//! Concurrent load against the instrumented `/status` endpoint

#![allow(clippy::expect_used)]

use axum::http::{Method, StatusCode};
use futures::future::join_all;
use statusd::config::Endpoints;
use statusd::server::{build_router, create_metrics, AppState, Server};
use statusd::status::StatusPicker;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const CONCURRENT_REQUESTS: usize = 200;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_counter_is_exact_under_concurrent_load() {
    let metrics = create_metrics().expect("create metrics");
    let picker = StatusPicker::with_default_choices().expect("built-in table");
    let app = build_router(Endpoints::Extended, AppState::new(picker, metrics.clone()));

    let server = Server::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind ephemeral port");
    let addr = server.local_addr();
    let token = CancellationToken::new();
    let handle = tokio::spawn(server.serve(app, token.clone(), Duration::from_secs(5)));

    let client = reqwest::Client::new();
    let url = format!("http://{}/status?status=503", addr);

    let responses = join_all((0..CONCURRENT_REQUESTS).map(|_| {
        let client = client.clone();
        let url = url.clone();
        async move { client.get(url).send().await }
    }))
    .await;

    for response in responses {
        assert_eq!(response.expect("request should succeed").status(), 503);
    }
    assert_eq!(
        metrics.outcome_count(StatusCode::SERVICE_UNAVAILABLE, &Method::GET),
        CONCURRENT_REQUESTS as u64
    );

    token.cancel();
    let result = handle.await.expect("server task should not panic");
    assert!(result.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_random_codes_match_counted_outcomes() {
    let metrics = create_metrics().expect("create metrics");
    let picker = StatusPicker::with_default_choices().expect("built-in table");
    let app = build_router(Endpoints::Extended, AppState::new(picker, metrics.clone()));

    let server = Server::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind ephemeral port");
    let addr = server.local_addr();
    let token = CancellationToken::new();
    let handle = tokio::spawn(server.serve(app, token.clone(), Duration::from_secs(5)));

    let client = reqwest::Client::new();
    let url = format!("http://{}/status?status=random", addr);

    let responses = join_all((0..CONCURRENT_REQUESTS).map(|_| {
        let client = client.clone();
        let url = url.clone();
        async move { client.post(url).send().await }
    }))
    .await;

    let mut observed: HashMap<u16, u64> = HashMap::new();
    for response in responses {
        let status = response.expect("request should succeed").status().as_u16();
        *observed.entry(status).or_default() += 1;
    }

    for (code, count) in &observed {
        assert!([200, 400, 500, 502, 503].contains(code), "unexpected code {}", code);
        let status = StatusCode::from_u16(*code).expect("valid code");
        assert_eq!(metrics.outcome_count(status, &Method::POST), *count);
    }
    assert_eq!(observed.values().sum::<u64>(), CONCURRENT_REQUESTS as u64);

    token.cancel();
    let result = handle.await.expect("server task should not panic");
    assert!(result.is_ok());
}
