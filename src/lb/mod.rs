//! 负载均衡与重试
//!
//! 负载均衡器从实例池的快照中挑出一个 Endpoint；重试调用器在其上
//! 按次数和总时长两个预算循环调用。

pub mod random;
pub mod retry;
pub mod round_robin;

pub use random::Random;
pub use retry::Retry;
pub use round_robin::RoundRobin;

use crate::endpoint::Endpoint;
use crate::error::Result;

/// 负载均衡器
///
/// 实例池为空时返回 [`TodoError::NoEndpoints`](crate::error::TodoError::NoEndpoints)，
/// 与网络错误区分开。
pub trait Balancer<Req, Resp>: Send + Sync {
    fn pick(&self) -> Result<Endpoint<Req, Resp>>;
}

impl<Req, Resp, B> Balancer<Req, Resp> for std::sync::Arc<B>
where
    B: Balancer<Req, Resp> + ?Sized,
{
    fn pick(&self) -> Result<Endpoint<Req, Resp>> {
        (**self).pick()
    }
}
