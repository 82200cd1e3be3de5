use std::future::IntoFuture;
use std::sync::Arc;

use mc_monitor::config::LoggingConfig;
use mc_monitor::cors::build_cors_layer;
use mc_monitor::shutdown::{drain_with_timeout, wait_for_signal};
use mc_monitor::{AppConfig, AppState, build_router};
use tokio::sync::Notify;

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.filter_directive().into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format.eq_ignore_ascii_case("compact") {
        builder.compact().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    // 配置加载早于日志初始化：日志级别与格式来自配置
    let config = match AppConfig::init_global() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config init failed: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(&config.logging);
    tracing::info!("配置文件: {:?}（缺省时使用默认配置）", AppConfig::config_path());

    let state = match AppState::from_config(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("HTTP client init failed: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "字体来源: {}（进程内缓存: {}），并发渲染许可: {}",
        config.font.url,
        config.font.cache_enabled,
        config.image.effective_parallelism()
    );

    let mut app = build_router(state, &config.api.prefix);
    if let Some(cors) = build_cors_layer(&config.cors) {
        tracing::info!("CORS 已启用: {:?}", config.cors.allowed_origins);
        app = app.layer(cors);
    }

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("OG: http://{}{}/og", addr, config.api.prefix);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);

    // 收到信号后停止接收新连接，并在超时时间内等待在途请求完成
    let signalled = Arc::new(Notify::new());
    let notify = signalled.clone();
    let serve = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let reason = wait_for_signal().await;
            tracing::info!("接收到退出信号: {:?}，开始优雅退出...", reason);
            notify.notify_one();
        })
        .into_future();
    tokio::pin!(serve);

    let result = tokio::select! {
        res = &mut serve => res,
        _ = signalled.notified() => {
            drain_with_timeout(&mut serve, config.shutdown.timeout_duration())
                .await
                .unwrap_or(Ok(()))
        }
    };

    if let Err(e) = result {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    tracing::info!("服务器已优雅关闭");
}
