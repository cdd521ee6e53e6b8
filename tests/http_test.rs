// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP-level tests driving the router directly.

mod harness;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use contact_relay::{
    config::Config,
    handlers::{router, AppState},
    metrics::ContactMetrics,
};
use harness::fixtures::{self, body, jane};
use harness::providers::{ScriptedProvider, Step};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn app(primary: Step, fallback: Step, max_requests: u32) -> Router {
    let t = fixtures::pipeline(
        ScriptedProvider::always("primary", primary),
        ScriptedProvider::always("fallback", fallback),
        max_requests,
    );
    let metrics = ContactMetrics::new().unwrap();

    router(Arc::new(AppState {
        pipeline: t.pipeline.with_metrics(metrics.clone()),
        metrics: Some(metrics),
        config: Config::default(),
    }))
}

fn post(uri: &str, client: &str, payload: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", client)
        .body(Body::from(payload))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_accepted_submission() {
    let app = app(Step::Deliver, Step::Deliver, 3);

    let response = app
        .oneshot(post("/api/send-email-modern", "198.51.100.1", jane()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Message sent successfully!");
    assert_eq!(body["method"], "primary");
    assert_eq!(body["autoReply"], true);
}

#[tokio::test]
async fn test_both_routes_share_rate_limit() {
    let app = app(Step::Deliver, Step::Deliver, 1);

    let response = app
        .clone()
        .oneshot(post("/api/send-email", "198.51.100.2", jane()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post("/api/send-email-modern", "198.51.100.2", jane()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()[header::RETRY_AFTER], "3600");

    let body = json_body(response).await;
    assert_eq!(body["retryAfter"], 3600);
    assert_eq!(body["error"], "Too many requests. Please try again later.");
}

#[tokio::test]
async fn test_validation_failure_details() {
    let app = app(Step::Deliver, Step::Deliver, 3);

    let response = app
        .oneshot(post(
            "/api/send-email-modern",
            "198.51.100.3",
            body("Jane Doe", "jane-at-x.com", "short"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"]["email"], "Invalid email address");
    assert_eq!(body["details"]["message"], "Message must be at least 10 characters");
    assert!(body["details"].get("name").is_none());
}

#[tokio::test]
async fn test_degraded_response() {
    let app = app(Step::Fail, Step::Fail, 3);

    let response = app
        .oneshot(post("/api/send-email-modern", "198.51.100.4", jane()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    let fallback = body["fallback"].as_str().unwrap();
    assert!(fallback.starts_with("mailto:owner@site.dev?subject="));
}

#[tokio::test]
async fn test_metrics_endpoint_counts_submissions() {
    let app = app(Step::Unavailable, Step::Deliver, 3);

    app.clone()
        .oneshot(post("/api/send-email-modern", "198.51.100.5", jane()))
        .await
        .unwrap();

    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains(r#"contact_submissions_total{result="accepted"} 1"#));
    assert!(text.contains(r#"contact_provider_attempts_total{provider="primary",status="unavailable"} 1"#));
}

#[tokio::test]
async fn test_health() {
    let app = app(Step::Deliver, Step::Deliver, 3);

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "contact-relay");
}
