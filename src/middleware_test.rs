// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the metrics middleware

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use tower::ServiceExt;

use super::{metrics, middleware::track_metrics};

fn instrumented_router() -> Router {
    Router::new()
        .route("/tracked", get(|| async { "ok" }))
        .layer(middleware::from_fn(track_metrics))
}

#[tokio::test]
async fn test_request_passes_through() {
    let response = instrumented_router()
        .oneshot(Request::builder().uri("/tracked").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_is_recorded() {
    instrumented_router()
        .oneshot(Request::builder().uri("/tracked").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let gathered = metrics::gather_metrics().unwrap();
    assert!(gathered.contains("sambacar_http_requests_total"));
    assert!(gathered.contains("/tracked"));
}

#[tokio::test]
async fn test_probe_paths_are_not_recorded() {
    let router = Router::new()
        .route("/api/v1/health", get(|| async { "ok" }))
        .layer(middleware::from_fn(track_metrics));

    router
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let gathered = metrics::gather_metrics().unwrap();
    assert!(!gathered.contains("path=\"/api/v1/health\""));
}

#[tokio::test]
async fn test_not_found_status_recorded() {
    let response = instrumented_router()
        .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
