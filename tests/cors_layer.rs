use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tower::ServiceExt;

use mc_monitor::config::{CorsConfig, OgConfig};
use mc_monitor::cors::build_cors_layer;
use mc_monitor::error::FontError;
use mc_monitor::features::og::{FontAsset, FontSource, RenderOptions};
use mc_monitor::{AppState, build_router};

struct NoFont;

impl FontSource for NoFont {
    fn fetch(&self) -> BoxFuture<'_, Result<FontAsset, FontError>> {
        async { Err(FontError::Empty) }.boxed()
    }
}

fn build_app(cors: &CorsConfig) -> Router {
    let state = AppState::new(Arc::new(NoFont), 1, RenderOptions::default(), OgConfig::default());
    let layer = build_cors_layer(cors).expect("cors layer");
    build_router(state, "/api").layer(layer)
}

fn cors_for(origin: &str) -> CorsConfig {
    CorsConfig {
        enabled: true,
        allowed_origins: vec![origin.to_string()],
        ..CorsConfig::default()
    }
}

#[tokio::test]
async fn cors_layer_adds_allow_origin_header() {
    let app = build_app(&cors_for("https://example.com"));
    let req = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://example.com")
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://example.com"
    );
}

#[tokio::test]
async fn cors_applies_to_failed_og_responses() {
    let app = build_app(&cors_for("*"));
    let req = Request::builder()
        .uri("/api/og")
        .header(header::ORIGIN, "https://social.example")
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn cors_preflight_allows_get() {
    let app = build_app(&cors_for("https://example.com"));
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/og")
        .header(header::ORIGIN, "https://example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");

    let methods = resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(methods.contains("GET"), "allow-methods: {methods}");
}
