//! 服务发现后端抽象和实现

pub mod consul;
pub mod memory;

use async_trait::async_trait;

use crate::discovery::config::ServiceQuery;
use crate::discovery::instance::ServiceInstance;
use crate::error::Result;

pub use consul::ConsulBackend;
pub use memory::InMemoryBackend;

/// 一次查询的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lookup {
    /// 后端返回的实例（可能已按服务名/首个标签/健康状态预过滤）
    pub instances: Vec<ServiceInstance>,

    /// 后端的变更序号，下一次阻塞查询从这里开始等待
    pub index: u64,
}

/// 服务发现后端 trait
///
/// 注意：由于需要动态分发（dyn），使用 async-trait
#[async_trait]
pub trait DiscoveryBackend: Send + Sync {
    /// 查询服务实例
    ///
    /// `last_index` 为 0 时立即返回；否则这是一次阻塞查询，直到后端的
    /// 变更序号超过 `last_index` 或等待超时才返回。变更通知就是通过
    /// 这个序号实现的。
    async fn lookup(&self, query: &ServiceQuery, last_index: u64) -> Result<Lookup>;

    /// 注册服务实例
    async fn register(&self, instance: &ServiceInstance) -> Result<()>;

    /// 注销服务实例
    async fn deregister(&self, instance_id: &str) -> Result<()>;
}
