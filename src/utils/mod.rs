//! 工具函数模块

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info};

use crate::error::{ErrorCode, Result, TodoError};
use crate::retry::{ExponentialBackoffPolicy, RetryPolicy};

const MAX_RETRIES: usize = 30;
const INITIAL_DELAY: Duration = Duration::from_millis(50);
const MAX_DELAY: Duration = Duration::from_millis(500);
const TOTAL_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_millis(100);

/// 监听在通配地址时，改用回环地址探测
pub fn probe_address(address: SocketAddr) -> SocketAddr {
    let ip = match address.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, address.port())
}

/// 等待服务启动就绪（通过 TCP 连接重试）
///
/// 使用指数退避重试连接，直到服务真正可以接受连接。
pub async fn wait_for_server_ready(address: SocketAddr) -> Result<()> {
    let address = probe_address(address);
    let backoff = ExponentialBackoffPolicy::new(MAX_RETRIES, INITIAL_DELAY, MAX_DELAY);
    let start = Instant::now();

    for attempt in 1..=backoff.max_attempts() {
        if start.elapsed() > TOTAL_TIMEOUT {
            break;
        }

        match timeout(CONNECT_TIMEOUT, TcpStream::connect(address)).await {
            Ok(Ok(_)) => {
                info!(
                    address = %address,
                    attempts = attempt,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "server is ready"
                );
                return Ok(());
            }
            Ok(Err(e)) => {
                debug!(address = %address, attempt, error = %e, "connection attempt failed, retrying");
            }
            Err(_) => {
                debug!(address = %address, attempt, "connection attempt timed out, retrying");
            }
        }

        sleep(backoff.backoff_duration(attempt)).await;
    }

    Err(TodoError::transport(
        ErrorCode::ConnectionTimeout,
        format!("server at {} not ready after {:?}", address, start.elapsed()),
    ))
}

/// 等待关闭信号（Ctrl+C 或 SIGTERM）
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("shutdown signal received (Ctrl+C)"),
        _ = terminate => info!("shutdown signal received (SIGTERM)"),
    }
}
