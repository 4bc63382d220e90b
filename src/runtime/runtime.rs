//! 服务运行时实现

use anyhow::{Context, Result};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::discovery::{DiscoveryBackend, ServiceInstance, ServiceRegistration};
use crate::health::HealthService;
use crate::runtime::config::RuntimeConfig;

/// 服务运行时
///
/// 执行以下步骤：
/// 1. 绑定监听并启动 HTTP 服务
/// 2. 等待服务就绪
/// 3. 标记健康并注册服务（如果配置了）
/// 4. 等待关闭信号
/// 5. 标记不健康并注销服务，等待 `drain_delay`
/// 6. 优雅关闭 HTTP 服务（超过 `shutdown_timeout` 强制退出）
pub struct ServiceRuntime {
    service_name: String,
    address: SocketAddr,
    config: RuntimeConfig,
    health: HealthService,
    registration: Option<ServiceRegistration>,
}

impl ServiceRuntime {
    pub fn new(service_name: impl Into<String>, address: SocketAddr) -> Self {
        Self {
            service_name: service_name.into(),
            address,
            config: RuntimeConfig::default(),
            health: HealthService::new(),
            registration: None,
        }
    }

    /// 设置运行时配置
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// 共享路由使用的健康状态
    pub fn with_health(mut self, health: HealthService) -> Self {
        self.health = health;
        self
    }

    /// 就绪后向服务发现后端注册 `instance`，退出前注销
    pub fn with_registration(
        mut self,
        backend: Arc<dyn DiscoveryBackend>,
        instance: ServiceInstance,
    ) -> Self {
        self.registration = Some(ServiceRegistration::new(backend, instance));
        self
    }

    /// 运行直到收到 Ctrl+C / SIGTERM
    pub async fn run(self, router: Router) -> Result<()> {
        self.run_until(router, crate::utils::shutdown_signal()).await
    }

    /// 运行直到 `signal` 完成
    pub async fn run_until<F>(self, router: Router, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind(self.address)
            .await
            .with_context(|| format!("failed to bind {}", self.address))?;
        self.run_with_listener(listener, router, signal).await
    }

    /// 使用已绑定的监听器运行（监听端口由调用方事先确定）
    pub async fn run_with_listener<F>(
        mut self,
        listener: TcpListener,
        router: Router,
        signal: F,
    ) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let local_addr = listener.local_addr()?;
        info!(
            service_name = %self.service_name,
            address = %local_addr,
            "starting service runtime"
        );

        let cancel = CancellationToken::new();
        let mut join_set = JoinSet::new();
        let server_cancel = cancel.clone();
        join_set.spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { server_cancel.cancelled().await })
                .await
                .context("http server failed")
        });

        if let Err(e) = self.wait_until_ready(local_addr).await {
            cancel.cancel();
            Self::wait_for_shutdown(&self.config, &mut join_set).await;
            return Err(e);
        }

        self.health.set_serving().await;

        if let Some(registration) = self.registration.as_mut() {
            if let Err(e) = registration.register().await {
                error!(error = %e, "service registration failed, shutting down service");
                self.health.set_not_serving().await;
                cancel.cancel();
                Self::wait_for_shutdown(&self.config, &mut join_set).await;
                return Err(anyhow::anyhow!("service registration failed: {}", e));
            }
        }

        tokio::pin!(signal);
        let exited_early = tokio::select! {
            _ = &mut signal => false,
            joined = join_set.join_next() => {
                match joined {
                    Some(Ok(Err(e))) => error!(error = %e, "http server stopped unexpectedly"),
                    Some(Err(e)) => error!(error = %e, "http server task panicked"),
                    _ => warn!("http server stopped unexpectedly"),
                }
                true
            }
        };

        info!(service_name = %self.service_name, "shutting down");
        self.health.set_not_serving().await;

        if let Some(mut registration) = self.registration.take() {
            if let Err(e) = registration.shutdown().await {
                warn!(error = %e, "failed to deregister service gracefully");
            }
        }

        if !exited_early && !self.config.drain_delay.is_zero() {
            debug!(delay_ms = self.config.drain_delay.as_millis() as u64, "draining");
            tokio::time::sleep(self.config.drain_delay).await;
        }

        cancel.cancel();
        Self::wait_for_shutdown(&self.config, &mut join_set).await;

        info!(service_name = %self.service_name, "service runtime stopped");
        if exited_early {
            anyhow::bail!("http server exited before shutdown was requested");
        }
        Ok(())
    }

    async fn wait_until_ready(&self, address: SocketAddr) -> Result<()> {
        let Some(limit) = self.config.ready_timeout else {
            return Ok(());
        };

        match tokio::time::timeout(limit, crate::utils::wait_for_server_ready(address)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(anyhow::anyhow!("service failed to become ready: {}", e)),
            Err(_) => Err(anyhow::anyhow!(
                "service ready check timeout after {:?}",
                limit
            )),
        }
    }

    async fn wait_for_shutdown(config: &RuntimeConfig, join_set: &mut JoinSet<Result<()>>) {
        let drained = tokio::time::timeout(config.shutdown_timeout, async {
            while let Some(result) = join_set.join_next().await {
                match result {
                    Ok(Ok(())) => info!("http server stopped gracefully"),
                    Ok(Err(e)) => warn!(error = %e, "http server stopped with error"),
                    Err(e) => warn!(error = %e, "http server task join error"),
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!("shutdown timeout, forcing exit");
            join_set.abort_all();
        }
    }
}
