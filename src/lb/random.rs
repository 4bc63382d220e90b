use rand::Rng;

use super::Balancer;
use crate::endpoint::{Endpoint, EndpointSource};
use crate::error::{Result, TodoError};

/// 随机负载均衡器
pub struct Random<S> {
    source: S,
}

impl<S> Random<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<Req, Resp, S> Balancer<Req, Resp> for Random<S>
where
    S: EndpointSource<Req, Resp>,
{
    fn pick(&self) -> Result<Endpoint<Req, Resp>> {
        let endpoints = self.source.endpoints();
        if endpoints.is_empty() {
            return Err(TodoError::NoEndpoints);
        }
        let idx = rand::thread_rng().gen_range(0..endpoints.len());
        Ok(endpoints[idx].clone())
    }
}
