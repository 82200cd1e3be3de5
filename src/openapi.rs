use utoipa::OpenApi;
use utoipa::openapi::server::{ServerBuilder, ServerVariableBuilder};
use utoipa::{Modify, openapi};

/// 为 Swagger UI 提供正确的“业务接口前缀”Servers 配置。
///
/// - OG 接口默认前缀为 `/api`（对应 `config.api.prefix` / `APP_API__PREFIX`）。
/// - `/health` 不带前缀，因此额外提供 `/` 作为备用 server。
struct ApiServers;

impl Modify for ApiServers {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let api = ServerBuilder::new()
            .url("{api_prefix}")
            .description(Some("业务接口（默认 /api）"))
            .parameter(
                "api_prefix",
                ServerVariableBuilder::new()
                    .default_value("/api")
                    .description(Some("业务接口前缀：对应 config.api.prefix")),
            )
            .build();

        let root = ServerBuilder::new()
            .url("/")
            .description(Some("根路径（用于 /health 等不带前缀接口）"))
            .build();

        openapi.servers = Some(vec![api, root]);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::og::handler::get_og_image,
        crate::features::og::handler::get_og_svg,
    ),
    components(schemas(
        crate::error::ProblemDetails,
        crate::features::health::handler::HealthResponse,
    )),
    modifiers(&ApiServers),
    tags(
        (name = "Image", description = "OG card APIs"),
        (name = "Health", description = "Health APIs"),
    ),
    info(
        title = "mc-monitor OG API",
        version = "0.1.0",
        description = "Minecraft server status Open Graph card renderer (Axum)"
    )
)]
pub struct ApiDoc;
