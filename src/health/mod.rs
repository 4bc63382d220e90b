//! 健康检查模块

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// 健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Unknown,
    Serving,
    NotServing,
}

/// 健康检查服务
///
/// 服务启动就绪后置为 Serving，开始关闭时置为 NotServing，
/// 让注册中心的健康检查先于进程退出摘除实例。
#[derive(Clone)]
pub struct HealthService {
    status: Arc<RwLock<HealthStatus>>,
}

impl HealthService {
    pub fn new() -> Self {
        Self {
            status: Arc::new(RwLock::new(HealthStatus::Unknown)),
        }
    }

    pub async fn set_status(&self, status: HealthStatus) {
        *self.status.write().await = status;
    }

    pub async fn get_status(&self) -> HealthStatus {
        *self.status.read().await
    }

    pub async fn set_serving(&self) {
        self.set_status(HealthStatus::Serving).await;
    }

    pub async fn set_not_serving(&self) {
        self.set_status(HealthStatus::NotServing).await;
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new()
    }
}
