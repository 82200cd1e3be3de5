/// 健康检查
pub mod health;

/// OG 卡片渲染
pub mod og;
