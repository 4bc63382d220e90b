//! 服务注册：启动时注册实例，关闭时注销

use std::sync::Arc;
use tracing::{info, warn};

use crate::discovery::{DiscoveryBackend, ServiceInstance};
use crate::error::Result;

/// 服务注册器
///
/// 应在服务关闭前显式调用 [`ServiceRegistration::shutdown`]；
/// Drop 只做尽力而为的注销。
pub struct ServiceRegistration {
    backend: Arc<dyn DiscoveryBackend>,
    instance: ServiceInstance,
    registered: bool,
}

impl ServiceRegistration {
    pub fn new(backend: Arc<dyn DiscoveryBackend>, instance: ServiceInstance) -> Self {
        Self {
            backend,
            instance,
            registered: false,
        }
    }

    pub fn instance(&self) -> &ServiceInstance {
        &self.instance
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// 向后端注册实例
    pub async fn register(&mut self) -> Result<()> {
        self.backend.register(&self.instance).await?;
        self.registered = true;
        info!(
            instance_id = %self.instance.instance_id,
            service = %self.instance.service_name,
            location = %self.instance.location(),
            "service registered"
        );
        Ok(())
    }

    /// 优雅关闭：注销实例（重复调用无副作用）
    pub async fn shutdown(&mut self) -> Result<()> {
        if !self.registered {
            return Ok(());
        }
        self.registered = false;

        let instance_id = &self.instance.instance_id;
        match self.backend.deregister(instance_id).await {
            Ok(()) => {
                info!(instance_id = %instance_id, "service deregistered");
                Ok(())
            }
            Err(e) => {
                warn!(instance_id = %instance_id, error = %e, "failed to deregister service");
                Err(e)
            }
        }
    }
}

impl Drop for ServiceRegistration {
    fn drop(&mut self) {
        if !self.registered {
            return;
        }

        // Drop 是同步的，只能把注销交给当前 runtime
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let backend = self.backend.clone();
            let instance_id = self.instance.instance_id.clone();
            handle.spawn(async move {
                match backend.deregister(&instance_id).await {
                    Ok(()) => info!(instance_id = %instance_id, "service deregistered (from drop)"),
                    Err(e) => warn!(
                        instance_id = %instance_id,
                        error = %e,
                        "failed to deregister service (from drop)"
                    ),
                }
            });
        } else {
            warn!(
                instance_id = %self.instance.instance_id,
                "cannot deregister service: tokio runtime not available"
            );
        }
    }
}
