use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::features::og::{DEFAULT_FONT_FAMILY, DEFAULT_FONT_URL};

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（未设置 RUST_LOG 时生效）
    pub level: String,
    /// 日志格式：full | compact
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "full".to_string(),
        }
    }
}

impl LoggingConfig {
    /// 默认的 EnvFilter 指令
    pub fn filter_directive(&self) -> String {
        format!("mc_monitor={},tower_http={}", self.level, self.level)
    }
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API 路由前缀（OG 卡片位于 `{prefix}/og`）
    pub prefix: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: "/api".to_string(),
        }
    }
}

/// CORS 配置（卡片通常被第三方页面跨域引用）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 是否启用 CORS
    #[serde(default)]
    pub enabled: bool,
    /// 允许的 Origin 列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// 预检缓存时间（秒）
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

/// 字体来源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontConfig {
    /// 字体文件 URL
    #[serde(default = "FontConfig::default_url")]
    pub url: String,
    /// 卡片中使用的字体名称
    #[serde(default = "FontConfig::default_family")]
    pub family: String,
    /// 下载超时（秒）
    #[serde(default = "FontConfig::default_timeout")]
    pub timeout_secs: u64,
    /// 是否在进程内缓存已下载的字体（关闭后每个请求都会重新下载）
    #[serde(default = "FontConfig::default_cache_enabled")]
    pub cache_enabled: bool,
    /// 字体缓存 TTL（秒）
    #[serde(default = "FontConfig::default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl FontConfig {
    fn default_url() -> String {
        DEFAULT_FONT_URL.to_string()
    }
    fn default_family() -> String {
        DEFAULT_FONT_FAMILY.to_string()
    }
    fn default_timeout() -> u64 {
        15
    }
    fn default_cache_enabled() -> bool {
        true
    }
    fn default_cache_ttl() -> u64 {
        24 * 60 * 60
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            family: Self::default_family(),
            timeout_secs: Self::default_timeout(),
            cache_enabled: Self::default_cache_enabled(),
            cache_ttl_secs: Self::default_cache_ttl(),
        }
    }
}

/// OG 响应配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OgConfig {
    /// 成功响应的 Cache-Control max-age（秒）
    #[serde(default = "OgConfig::default_max_age")]
    pub cache_max_age_secs: u64,
}

impl OgConfig {
    fn default_max_age() -> u64 {
        60
    }
}

impl Default for OgConfig {
    fn default() -> Self {
        Self {
            cache_max_age_secs: Self::default_max_age(),
        }
    }
}

/// 图片渲染配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ImageRenderConfig {
    /// 是否优先速度渲染（OptimizeSpeed），提升栅格化性能，可能略降画质
    #[serde(default)]
    pub optimize_speed: bool,
    /// 并发渲染许可数（0=自动，取 CPU 核心数）
    #[serde(default)]
    pub max_parallel: u32,
}

impl ImageRenderConfig {
    /// 实际生效的并发渲染许可数
    pub fn effective_parallelism(&self) -> usize {
        if self.max_parallel == 0 {
            num_cpus::get()
        } else {
            self.max_parallel as usize
        }
    }
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 收到退出信号后等待在途请求完成的最长时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        30
    }

    /// 获取优雅退出超时时间
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    /// 字体来源
    #[serde(default)]
    pub font: FontConfig,
    /// OG 响应
    #[serde(default)]
    pub og: OgConfig,
    /// 图片渲染
    #[serde(default)]
    pub image: ImageRenderConfig,
    /// 优雅退出
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 从配置文件加载配置（文件可缺省），支持环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let builder = ConfigBuilder::builder()
            .add_source(File::from(config_path).required(false))
            // 支持环境变量覆盖，例如：APP_API__PREFIX、APP_FONT__URL
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = builder.try_deserialize()?;
        tracing::debug!(
            "配置加载完成: font.url = {}, font.cache_enabled = {}",
            config.font.url,
            config.font.cache_enabled
        );
        Ok(config)
    }

    /// 获取全局配置单例
    pub fn global() -> &'static AppConfig {
        CONFIG.get_or_init(|| {
            tracing::warn!("配置未显式初始化，使用默认配置");
            AppConfig::default()
        })
    }

    /// 初始化全局配置
    pub fn init_global() -> Result<&'static AppConfig, ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        Ok(Self::global())
    }

    /// 获取配置文件路径（可通过 MC_MONITOR_CONFIG 指定）
    pub fn config_path() -> PathBuf {
        std::env::var_os("MC_MONITOR_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
