use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tower::ServiceExt;

use mc_monitor::config::OgConfig;
use mc_monitor::error::FontError;
use mc_monitor::features::og::{FontAsset, FontSource, RenderOptions};
use mc_monitor::{AppState, build_router};

struct OfflineFontSource;

impl FontSource for OfflineFontSource {
    fn fetch(&self) -> BoxFuture<'_, Result<FontAsset, FontError>> {
        async { Err(FontError::Network("offline".into())) }.boxed()
    }
}

fn build_app() -> Router {
    let state = AppState::new(
        Arc::new(OfflineFontSource),
        1,
        RenderOptions::default(),
        OgConfig::default(),
    );
    build_router(state, "/api")
}

fn header_request_id(resp: &axum::response::Response) -> String {
    resp.headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

#[tokio::test]
async fn request_id_is_generated_when_missing() {
    let resp = build_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .expect("request /health");

    assert_eq!(resp.status(), StatusCode::OK);
    let request_id = header_request_id(&resp);
    assert!(request_id.starts_with("req_"), "got {request_id}");
}

#[tokio::test]
async fn request_id_uses_client_value_when_valid() {
    let resp = build_app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "client.req-001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request /health");

    assert_eq!(header_request_id(&resp), "client.req-001");
}

#[tokio::test]
async fn invalid_client_request_id_is_replaced() {
    let resp = build_app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "bad id/with spaces")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request /health");

    let request_id = header_request_id(&resp);
    assert_ne!(request_id, "bad id/with spaces");
    assert!(request_id.starts_with("req_"));
}

#[tokio::test]
async fn unknown_route_returns_problem_details_with_request_id() {
    let resp = build_app()
        .oneshot(
            Request::builder()
                .uri("/nope")
                .header("x-request-id", "err.req-001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request /nope");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "application/problem+json"
    );
    let request_id_header = header_request_id(&resp);
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("parse json");
    assert_eq!(json["status"].as_u64(), Some(404));
    assert_eq!(json["requestId"].as_str(), Some(request_id_header.as_str()));
}

#[tokio::test]
async fn og_failure_keeps_request_id_header_and_plain_body() {
    let resp = build_app()
        .oneshot(
            Request::builder()
                .uri("/api/og")
                .header("x-request-id", "og.req-001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request /api/og");

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header_request_id(&resp), "og.req-001");
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    assert_eq!(&body[..], b"Failed to generate image");
}

#[tokio::test]
async fn health_reports_service_name() {
    let resp = build_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .expect("request /health");
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("parse json");
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "mc-monitor");
}
