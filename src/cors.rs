use axum::http::{HeaderValue, Method, header};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::config::CorsConfig;

/// 根据配置构建 CORS 中间件。
///
/// 卡片接口只读，允许的方法固定为 GET/HEAD；`x-request-id` 始终暴露给浏览器端。
pub fn build_cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    if !cors.enabled {
        return None;
    }

    let (any_origin, origins) = parse_allowed_origins(&cors.allowed_origins);
    if !any_origin && origins.is_empty() {
        tracing::warn!("CORS 已启用但 allowed_origins 为空，已跳过启用");
        return None;
    }

    let mut layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD])
        .expose_headers([header::HeaderName::from_static("x-request-id")]);

    layer = if any_origin {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    };

    if let Some(secs) = cors.max_age_secs
        && secs > 0
    {
        layer = layer.max_age(Duration::from_secs(secs));
    }

    Some(layer)
}

fn parse_allowed_origins(values: &[String]) -> (bool, Vec<HeaderValue>) {
    let mut any = false;
    let mut origins = Vec::new();
    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        if value == "*" {
            any = true;
            continue;
        }
        match HeaderValue::from_str(value) {
            Ok(v) => origins.push(v),
            Err(_) => tracing::warn!("CORS allowed_origins 含无效值: {}", value),
        }
    }
    (any, origins)
}

#[cfg(test)]
mod tests {
    use super::{build_cors_layer, parse_allowed_origins};
    use crate::config::CorsConfig;

    #[test]
    fn disabled_by_default() {
        assert!(build_cors_layer(&CorsConfig::default()).is_none());
    }

    #[test]
    fn skips_when_origins_empty() {
        let cors = CorsConfig {
            enabled: true,
            allowed_origins: vec!["  ".to_string()],
            ..CorsConfig::default()
        };
        assert!(build_cors_layer(&cors).is_none());
    }

    #[test]
    fn wildcard_and_explicit_origins() {
        let (any, origins) = parse_allowed_origins(&[
            "*".to_string(),
            " https://example.com ".to_string(),
            "bad\norigin".to_string(),
        ]);
        assert!(any);
        assert_eq!(origins.len(), 1);
        assert_eq!(origins[0], "https://example.com");

        let cors = CorsConfig {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            max_age_secs: Some(600),
        };
        assert!(build_cors_layer(&cors).is_some());
    }
}
