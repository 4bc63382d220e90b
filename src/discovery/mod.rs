//! 服务发现模块
//!
//! 后端（Consul / 内存）-> 实例化器（位置集合）-> 端点器（位置 -> Endpoint），
//! 外加服务端使用的注册器。

pub mod backend;
pub mod config;
pub mod endpointer;
pub mod instance;
pub mod instancer;
pub mod registration;

use std::sync::Arc;

pub use backend::{ConsulBackend, DiscoveryBackend, InMemoryBackend, Lookup};
pub use config::{BackendType, DiscoveryConfig, HealthCheckConfig, ServiceQuery};
pub use endpointer::Endpointer;
pub use instance::ServiceInstance;
pub use instancer::Instancer;
pub use registration::ServiceRegistration;

use crate::error::Result;

/// 从配置创建服务发现后端
pub fn create_backend(config: &DiscoveryConfig) -> Result<Arc<dyn DiscoveryBackend>> {
    match config.backend {
        BackendType::Consul => Ok(Arc::new(ConsulBackend::new(config)?)),
        BackendType::Memory => Ok(Arc::new(InMemoryBackend::with_wait(config.wait()))),
    }
}
