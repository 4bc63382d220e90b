use std::sync::atomic::{AtomicUsize, Ordering};

use super::Balancer;
use crate::endpoint::{Endpoint, EndpointSource};
use crate::error::{Result, TodoError};

/// 轮询负载均衡器
///
/// 计数器单调递增，对当前池大小取模；并发 `pick` 之间只共享这个原子计数器。
pub struct RoundRobin<S> {
    source: S,
    counter: AtomicUsize,
}

impl<S> RoundRobin<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            counter: AtomicUsize::new(0),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<Req, Resp, S> Balancer<Req, Resp> for RoundRobin<S>
where
    S: EndpointSource<Req, Resp>,
{
    fn pick(&self) -> Result<Endpoint<Req, Resp>> {
        let endpoints = self.source.endpoints();
        if endpoints.is_empty() {
            return Err(TodoError::NoEndpoints);
        }
        let idx = self.counter.fetch_add(1, Ordering::Relaxed) % endpoints.len();
        Ok(endpoints[idx].clone())
    }
}
