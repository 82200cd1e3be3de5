use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// OG 图片失败时对外返回的唯一文本（不区分失败原因）
pub const OG_FAILURE_BODY: &str = "Failed to generate image";

/// 应用统一错误类型（用于 OG 以外的 JSON 接口）
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum AppError {
    /// 路由不存在
    #[error("未找到: {0}")]
    NotFound(String),
}

/// 字体拉取错误
#[derive(Error, Debug, Clone)]
pub enum FontError {
    /// 网络请求错误
    #[error("字体下载网络错误: {0}")]
    Network(String),

    /// 上游请求超时（包含 connect/read 等阶段）
    #[error("字体下载超时")]
    Timeout,

    /// 上游返回非 2xx 状态码
    #[error("字体下载返回异常状态码: {0}")]
    Status(u16),

    /// 响应体为空
    #[error("字体数据为空")]
    Empty,
}

/// 布局与栅格化错误
#[derive(Error, Debug)]
pub enum RenderError {
    /// 字体数据无法解析为任何字形
    #[error("字体数据无法解析")]
    UnusableFont,

    /// SVG 生成或解析失败
    #[error("SVG 处理失败: {0}")]
    Svg(String),

    /// 画布创建失败
    #[error("创建画布失败: {width}x{height}")]
    Pixmap { width: u32, height: u32 },

    /// PNG 编码失败
    #[error("PNG 编码失败: {0}")]
    Encode(String),
}

/// OG 卡片渲染流水线的统一错误边界。
///
/// 任何变体都会折叠为同一个 500 纯文本响应，原始细节只写入服务端日志。
#[derive(Error, Debug)]
pub enum OgError {
    /// 查询参数解析失败
    #[error("查询参数解析失败: {0}")]
    Query(String),

    /// 字体拉取失败
    #[error(transparent)]
    Font(#[from] FontError),

    /// 布局或栅格化失败
    #[error(transparent)]
    Render(#[from] RenderError),

    /// 渲染许可或阻塞任务失败
    #[error("渲染任务执行失败: {0}")]
    Task(String),
}

impl IntoResponse for OgError {
    fn into_response(self) -> Response {
        let request_id = crate::request_id::current_request_id().unwrap_or_default();
        tracing::error!(request_id = %request_id, "OG 图片生成失败: {}", self);
        let mut res = (StatusCode::INTERNAL_SERVER_ERROR, OG_FAILURE_BODY).into_response();
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        res
    }
}

/// RFC7807 风格的错误响应（Problem Details）。
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// 问题类型（URI）。若无更细分的类型，可使用 about:blank。
    #[serde(rename = "type")]
    #[schema(example = "about:blank")]
    pub type_url: String,

    /// 简短标题，用于概括错误。
    #[schema(example = "Not Found")]
    pub title: String,

    /// HTTP 状态码（与响应 status 一致）。
    #[schema(example = 404)]
    pub status: u16,

    /// 人类可读的详细信息（尽量稳定，不建议依赖解析）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// 稳定的错误码，用于程序化处理。
    #[schema(example = "NOT_FOUND")]
    pub code: String,

    /// 可选：请求追踪 ID。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn stable_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
        }
    }

    fn title(&self) -> &'static str {
        match self.status_code() {
            StatusCode::NOT_FOUND => "Not Found",
            _ => "Error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::debug!("{}", self);

        let problem = ProblemDetails {
            type_url: "about:blank".to_string(),
            title: self.title().to_string(),
            status: status.as_u16(),
            detail: Some(self.to_string()),
            code: self.stable_code().to_string(),
            request_id: crate::request_id::current_request_id(),
        };

        let mut res = Json(problem).into_response();
        *res.status_mut() = status;
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        res
    }
}

// =============== Error conversions for common external errors ===============

impl From<reqwest::Error> for FontError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FontError::Timeout
        } else if let Some(status) = err.status() {
            FontError::Status(status.as_u16())
        } else {
            FontError::Network(err.to_string())
        }
    }
}
