//! 优雅退出
//!
//! 监听 SIGINT/SIGTERM（Windows 下为 Ctrl+C），供 `axum::serve(...).with_graceful_shutdown` 使用。

use std::time::Duration;
use tracing::{error, info, warn};

/// 退出原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// 用户中断信号 (Ctrl+C)
    Interrupt,
    /// 终止信号 (SIGTERM)
    Terminate,
}

/// 等待第一个退出信号
pub async fn wait_for_signal() -> ShutdownReason {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (mut sigint, mut sigterm) =
            match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
                (Ok(i), Ok(t)) => (i, t),
                (Err(e), _) | (_, Err(e)) => {
                    error!("Unix 信号处理器注册失败，回退到 Ctrl+C: {}", e);
                    return wait_for_ctrl_c().await;
                }
            };

        tokio::select! {
            _ = sigint.recv() => {
                info!("接收到SIGINT信号 (Ctrl+C)");
                ShutdownReason::Interrupt
            }
            _ = sigterm.recv() => {
                info!("接收到SIGTERM信号");
                ShutdownReason::Terminate
            }
        }
    }

    #[cfg(not(unix))]
    {
        wait_for_ctrl_c().await
    }
}

async fn wait_for_ctrl_c() -> ShutdownReason {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("监听Ctrl+C信号失败: {}", e);
        // 无法监听信号时永不触发退出，交由进程管理器强制结束
        std::future::pending::<()>().await;
    }
    info!("接收到Ctrl+C信号");
    ShutdownReason::Interrupt
}

/// 在 `grace` 时间内等待 `serve` 完成；超时则放弃在途请求直接返回。
pub async fn drain_with_timeout<F>(serve: F, grace: Duration) -> Option<F::Output>
where
    F: std::future::Future,
{
    match tokio::time::timeout(grace, serve).await {
        Ok(out) => Some(out),
        Err(_) => {
            warn!("优雅退出超时（{}秒），放弃在途请求", grace.as_secs());
            None
        }
    }
}
