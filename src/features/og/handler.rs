use std::time::Instant;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Uri, header},
    response::{IntoResponse, Response},
    routing::get,
};

use crate::error::OgError;
use crate::state::AppState;

use super::font::FontAsset;
use super::params::{CardFields, RenderRequest};
use super::renderer;

/// 参数提取 → MOTD 清洗 → 字体获取。字体是流水线中唯一的挂起点。
async fn prepare(state: &AppState, uri: &Uri) -> Result<(CardFields, FontAsset), OgError> {
    let req = RenderRequest::from_uri(uri)?;
    tracing::debug!(
        ip = %req.ip,
        online = %req.online,
        max = %req.max,
        "OG 请求参数"
    );
    let fields = req.sanitized();

    let t_font = Instant::now();
    let font = state.font_source.fetch().await?;
    tracing::debug!("字体就绪，耗时: {:?}ms", t_font.elapsed().as_millis());
    Ok((fields, font))
}

/// 渲染 OG 卡片 PNG（不含 HTTP 包装，便于复用与测试）
pub async fn render_og_png(state: &AppState, uri: &Uri) -> Result<Vec<u8>, OgError> {
    let (fields, font) = prepare(state, uri).await?;

    let t_wait = Instant::now();
    let _permit = state
        .render_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| OgError::Task(format!("获取渲染信号量失败: {e}")))?;
    tracing::debug!("渲染许可等待: {:?}ms", t_wait.elapsed().as_millis());

    // 布局与栅格化是 CPU 密集操作，移出 tokio worker。
    let opts = state.render_options;
    let png = tokio::task::spawn_blocking(move || renderer::render_card_png(&fields, &font, opts))
        .await
        .map_err(|e| OgError::Task(format!("阻塞渲染任务执行失败: {e}")))??;
    Ok(png)
}

fn cache_control(state: &AppState) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "public, max-age={}",
        state.og.cache_max_age_secs
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("no-store"))
}

#[utoipa::path(
    get,
    path = "/og",
    summary = "生成 MC 服务器状态 OG 卡片",
    description = "根据查询参数渲染 1200×630 的 Open Graph 预览图（PNG）。MOTD 中的 `§x` 颜色代码会被去除；任何失败统一返回 500 纯文本 `Failed to generate image`。",
    params(super::params::OgQuery),
    responses(
        (status = 200, description = "PNG bytes of the 1200x630 card"),
        (status = 500, description = "Failed to generate image", body = String, content_type = "text/plain")
    ),
    tag = "Image"
)]
pub async fn get_og_image(State(state): State<AppState>, uri: Uri) -> Result<Response, OgError> {
    let t0 = Instant::now();
    let png = render_og_png(&state, &uri).await?;
    tracing::info!(
        "OG 图片生成完成: {} 字节, 总耗时: {:?}ms",
        png.len(),
        t0.elapsed().as_millis()
    );
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/png")),
            (header::CACHE_CONTROL, cache_control(&state)),
        ],
        png,
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/og.svg",
    summary = "生成 OG 卡片的 SVG 文档",
    description = "与 /og 使用相同的参数与布局，但直接返回矢量文档（不做栅格化），便于调试布局。",
    params(super::params::OgQuery),
    responses(
        (status = 200, description = "SVG document of the card"),
        (status = 500, description = "Failed to generate image", body = String, content_type = "text/plain")
    ),
    tag = "Image"
)]
pub async fn get_og_svg(State(state): State<AppState>, uri: Uri) -> Result<Response, OgError> {
    let (fields, font) = prepare(&state, &uri).await?;
    let svg = tokio::task::spawn_blocking(move || renderer::render_card_svg(&fields, &font))
        .await
        .map_err(|e| OgError::Task(format!("阻塞 SVG 生成任务执行失败: {e}")))??;
    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("image/svg+xml; charset=utf-8"),
            ),
            (header::CACHE_CONTROL, cache_control(&state)),
        ],
        svg,
    )
        .into_response())
}

pub fn create_og_router() -> Router<AppState> {
    Router::new()
        .route("/og", get(get_og_image))
        .route("/og.svg", get(get_og_svg))
}
