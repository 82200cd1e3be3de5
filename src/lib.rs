/// 统一错误处理模块
pub mod error;

/// 配置模块
pub mod config;

/// 功能聚合模块
pub mod features;

/// 应用状态聚合模块
pub mod state;

/// 路由组装
pub mod app;

/// OpenAPI 文档
pub mod openapi;

/// CORS 中间件
pub mod cors;

/// request_id 中间件
pub mod request_id;

/// 优雅退出模块
pub mod shutdown;

/// HTTP Client 复用工具
pub mod http;

// 导出常用类型供外部使用
pub use app::build_router;
pub use config::AppConfig;
pub use error::{AppError, OG_FAILURE_BODY, OgError};
pub use state::AppState;
