//! 可调用操作（Endpoint）抽象
//!
//! 一个 Endpoint 表示针对某一个实例的一次逻辑调用。它就是一个
//! `tower::Service`，可以克隆、可以跨线程共享，因此读者拿到的快照
//! 与实例池的后续变更互不干扰。

use std::sync::Arc;
use tower::util::BoxCloneSyncService;

use crate::error::Result;

/// 绑定到单个网络位置的可调用操作
pub type Endpoint<Req, Resp> = BoxCloneSyncService<Req, Resp, crate::error::TodoError>;

/// 位置下线时执行的资源释放动作
pub type Closer = Box<dyn FnOnce() + Send>;

/// Endpoint 工厂：把一个网络位置（host:port）变成一个可调用操作
pub trait Factory<Req, Resp>: Send + Sync + 'static {
    fn make(&self, location: &str) -> Result<(Endpoint<Req, Resp>, Option<Closer>)>;
}

impl<Req, Resp, F> Factory<Req, Resp> for F
where
    F: Fn(&str) -> Result<(Endpoint<Req, Resp>, Option<Closer>)> + Send + Sync + 'static,
{
    fn make(&self, location: &str) -> Result<(Endpoint<Req, Resp>, Option<Closer>)> {
        self(location)
    }
}

/// 当前可用 Endpoint 的只读快照来源
pub trait EndpointSource<Req, Resp>: Send + Sync {
    fn endpoints(&self) -> Arc<Vec<Endpoint<Req, Resp>>>;
}

/// 固定的 Endpoint 集合（不随服务发现变化）
pub struct FixedEndpoints<Req, Resp> {
    endpoints: Arc<Vec<Endpoint<Req, Resp>>>,
}

impl<Req, Resp> FixedEndpoints<Req, Resp> {
    pub fn new(endpoints: Vec<Endpoint<Req, Resp>>) -> Self {
        Self {
            endpoints: Arc::new(endpoints),
        }
    }
}

impl<Req, Resp> EndpointSource<Req, Resp> for FixedEndpoints<Req, Resp>
where
    Req: 'static,
    Resp: 'static,
{
    fn endpoints(&self) -> Arc<Vec<Endpoint<Req, Resp>>> {
        self.endpoints.clone()
    }
}

impl<Req, Resp, S> EndpointSource<Req, Resp> for Arc<S>
where
    S: EndpointSource<Req, Resp> + ?Sized,
{
    fn endpoints(&self) -> Arc<Vec<Endpoint<Req, Resp>>> {
        (**self).endpoints()
    }
}
