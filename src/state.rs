use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::{AppConfig, OgConfig};
use crate::features::og::{FontSource, RenderOptions, build_font_source};

/// 聚合的应用共享状态（只读，跨请求共享）
#[derive(Clone)]
pub struct AppState {
    /// 字体来源（远端下载，可叠加进程内缓存）
    pub font_source: Arc<dyn FontSource>,
    /// 控制并发渲染的信号量（限制 CPU 密集型任务数量）
    pub render_semaphore: Arc<Semaphore>,
    /// 栅格化选项
    pub render_options: RenderOptions,
    /// OG 响应配置
    pub og: OgConfig,
}

impl AppState {
    /// 按配置构建共享状态
    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let font_source = build_font_source(&config.font)?;
        Ok(Self::new(
            font_source,
            config.image.effective_parallelism(),
            RenderOptions {
                optimize_speed: config.image.optimize_speed,
            },
            config.og.clone(),
        ))
    }

    pub fn new(
        font_source: Arc<dyn FontSource>,
        max_parallel: usize,
        render_options: RenderOptions,
        og: OgConfig,
    ) -> Self {
        Self {
            font_source,
            render_semaphore: Arc::new(Semaphore::new(max_parallel.max(1))),
            render_options,
            og,
        }
    }
}
