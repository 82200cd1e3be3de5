use axum::{Router, http::Uri, routing::get};
use tower_http::compression::CompressionLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::AppError;
use crate::features::{health, og};
use crate::openapi::ApiDoc;
use crate::request_id::request_id_middleware;
use crate::state::AppState;

/// 响应压缩策略：PNG 等已压缩图片不再压缩，SVG/JSON/文本照常压缩。
pub fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    SizeAbove::default()
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

/// 组装完整路由：`/health`、`{api_prefix}/og`、`/docs`，外加 request_id 与压缩中间件。
pub fn build_router(state: AppState, api_prefix: &str) -> Router {
    let api = og::create_og_router();
    let api_router = if api_prefix.is_empty() || api_prefix == "/" {
        Router::new().merge(api)
    } else {
        Router::new().nest(api_prefix, api)
    };

    Router::new()
        .route("/health", get(health::health_check))
        .merge(api_router)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .with_state(state)
        .layer(CompressionLayer::new().compress_when(compression_predicate()))
        .layer(axum::middleware::from_fn(request_id_middleware))
}

#[cfg(test)]
mod compression_predicate_tests {
    use super::compression_predicate;
    use axum::body::Body;
    use axum::http::{Response as HttpResponse, header};
    use tower_http::compression::predicate::Predicate;

    fn should_compress_for(ct: &str) -> bool {
        // 命中 SizeAbove（默认 32B），避免因为 body 太小导致测试不稳定。
        let body_bytes = vec![b'x'; 2048];
        let resp = HttpResponse::builder()
            .header(header::CONTENT_TYPE, ct)
            .body(Body::from(body_bytes))
            .unwrap();
        compression_predicate().should_compress(&resp)
    }

    #[test]
    fn png_cards_are_not_compressed() {
        assert!(!should_compress_for("image/png"));
    }

    #[test]
    fn svg_cards_and_text_are_compressed() {
        assert!(should_compress_for("image/svg+xml; charset=utf-8"));
        assert!(should_compress_for("text/plain; charset=utf-8"));
    }
}
