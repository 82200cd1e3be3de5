use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use moka::future::Cache;
use reqwest::Client;

use crate::config::FontConfig;
use crate::error::FontError;

/// 默认字体地址（Google Fonts 提供的 Noto Sans SC，覆盖 CJK 字形）
pub const DEFAULT_FONT_URL: &str =
    "https://fonts.gstatic.com/s/notosanssc/v35/k3k_oo52o_wA2sOaxLM1PjM3-_0ncy_e8W-v.ttf";
/// 卡片使用的字体名称
pub const DEFAULT_FONT_FAMILY: &str = "Noto Sans SC";

/// 内存中的字体文件
#[derive(Debug, Clone)]
pub struct FontAsset {
    pub family: String,
    pub data: Bytes,
}

/// 字体来源。渲染流水线只依赖该 trait，测试可替换为桩实现。
pub trait FontSource: Send + Sync {
    fn fetch(&self) -> BoxFuture<'_, Result<FontAsset, FontError>>;
}

/// 每次调用都向远端发起一次 GET 的字体来源
pub struct HttpFontSource {
    client: &'static Client,
    url: String,
    family: String,
}

impl HttpFontSource {
    pub fn new(cfg: &FontConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: crate::http::font_client(Duration::from_secs(cfg.timeout_secs))?,
            url: cfg.url.clone(),
            family: cfg.family.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn download(&self) -> Result<FontAsset, FontError> {
        let t0 = Instant::now();
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FontError::Status(status.as_u16()));
        }
        let data = resp.bytes().await?;
        if data.is_empty() {
            return Err(FontError::Empty);
        }
        tracing::info!(
            "字体下载完成: {} 字节, 耗时: {:?}ms",
            data.len(),
            t0.elapsed().as_millis()
        );
        Ok(FontAsset {
            family: self.family.clone(),
            data,
        })
    }
}

impl FontSource for HttpFontSource {
    fn fetch(&self) -> BoxFuture<'_, Result<FontAsset, FontError>> {
        self.download().boxed()
    }
}

/// 进程内字体缓存。字体按 URL 视为不可变，命中后不再回源。
pub struct CachedFontSource {
    inner: Arc<dyn FontSource>,
    key: String,
    cache: Cache<String, FontAsset>,
}

impl CachedFontSource {
    pub fn new(inner: Arc<dyn FontSource>, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            inner,
            key: key.into(),
            cache: Cache::builder()
                .max_capacity(4)
                .time_to_live(ttl)
                .build(),
        }
    }
}

impl FontSource for CachedFontSource {
    fn fetch(&self) -> BoxFuture<'_, Result<FontAsset, FontError>> {
        async move {
            self.cache
                .try_get_with(self.key.clone(), async { self.inner.fetch().await })
                .await
                .map_err(|e: Arc<FontError>| (*e).clone())
        }
        .boxed()
    }
}

/// 按配置构建字体来源（可选叠加进程内缓存）
pub fn build_font_source(cfg: &FontConfig) -> Result<Arc<dyn FontSource>, reqwest::Error> {
    let http = HttpFontSource::new(cfg)?;
    if !cfg.cache_enabled {
        return Ok(Arc::new(http));
    }
    let key = http.url().to_string();
    Ok(Arc::new(CachedFontSource::new(
        Arc::new(http),
        key,
        Duration::from_secs(cfg.cache_ttl_secs.max(1)),
    )))
}
