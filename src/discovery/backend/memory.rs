//! 内存服务发现后端（用于测试和单机开发）

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;

use crate::discovery::{DiscoveryBackend, Lookup, ServiceInstance, ServiceQuery};
use crate::error::{Result, TodoError};

#[derive(Debug, Default)]
struct Registry {
    index: u64,
    instances: BTreeMap<String, ServiceInstance>,
}

/// 内存服务发现后端
///
/// 每次变更递增序号，阻塞查询通过 `watch` 通道等待变更。
pub struct InMemoryBackend {
    state: watch::Sender<Registry>,
    wait: Duration,
    unavailable: AtomicBool,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::with_wait(Duration::from_secs(10))
    }

    /// 指定阻塞查询的最长等待时间
    pub fn with_wait(wait: Duration) -> Self {
        let (state, _) = watch::channel(Registry {
            index: 1,
            instances: BTreeMap::new(),
        });
        Self {
            state,
            wait,
            unavailable: AtomicBool::new(false),
        }
    }

    /// 修改实例的健康状态
    pub fn set_health(&self, instance_id: &str, healthy: bool) -> bool {
        self.state.send_if_modified(|registry| {
            match registry.instances.get_mut(instance_id) {
                Some(instance) if instance.healthy != healthy => {
                    instance.healthy = healthy;
                    registry.index += 1;
                    true
                }
                _ => false,
            }
        })
    }

    /// 模拟后端不可用（查询返回错误），恢复后查询照常进行
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
        // 唤醒正在阻塞的查询
        self.state.send_modify(|_| {});
    }

    /// 当前注册的全部实例
    pub fn instances(&self) -> Vec<ServiceInstance> {
        self.state.borrow().instances.values().cloned().collect()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TodoError::discovery("in-memory backend unavailable"));
        }
        Ok(())
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiscoveryBackend for InMemoryBackend {
    async fn lookup(&self, query: &ServiceQuery, last_index: u64) -> Result<Lookup> {
        self.check_available()?;

        let mut rx = self.state.subscribe();
        let current = rx.borrow_and_update().index;
        if last_index > 0 && current <= last_index {
            // 超时即返回当前结果，与 Consul 的阻塞查询一致
            let _ = tokio::time::timeout(self.wait, rx.changed()).await;
            self.check_available()?;
        }

        let registry = rx.borrow();
        let instances = registry
            .instances
            .values()
            .filter(|inst| inst.service_name == query.service)
            .filter(|inst| inst.matches_tags(&query.tags))
            .filter(|inst| !query.passing_only || inst.healthy)
            .cloned()
            .collect();

        Ok(Lookup {
            instances,
            index: registry.index,
        })
    }

    async fn register(&self, instance: &ServiceInstance) -> Result<()> {
        self.check_available()?;
        self.state.send_modify(|registry| {
            registry
                .instances
                .insert(instance.instance_id.clone(), instance.clone());
            registry.index += 1;
        });
        Ok(())
    }

    async fn deregister(&self, instance_id: &str) -> Result<()> {
        self.check_available()?;
        self.state.send_if_modified(|registry| {
            let removed = registry.instances.remove(instance_id).is_some();
            if removed {
                registry.index += 1;
            }
            removed
        });
        Ok(())
    }
}
