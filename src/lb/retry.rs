//! 重试调用器

use std::time::Duration;
use tokio::time::Instant;
use tower::ServiceExt;
use tracing::{debug, warn};

use super::Balancer;
use crate::error::{ErrorCode, Result, TodoError};
use crate::retry::{FixedRetryPolicy, RetryPolicy};

/// 在负载均衡器之上重试
///
/// 每次尝试重新 `pick`，尝试之间严格串行。业务错误原样返回，不重试；
/// 次数或总时长耗尽时返回 [`TodoError::RetryExhausted`]，其中带着最后一次的错误。
/// 总时长同时约束正在进行的那次尝试。
///
/// 取消：丢弃 `call` 返回的 future 即中止当前尝试和后续重试。
pub struct Retry<B, P = FixedRetryPolicy> {
    balancer: B,
    policy: P,
    timeout: Duration,
}

impl<B> Retry<B> {
    /// 失败后立即重试，最多 `max_attempts` 次，总时长不超过 `timeout`
    pub fn new(max_attempts: usize, timeout: Duration, balancer: B) -> Self {
        Self {
            balancer,
            policy: FixedRetryPolicy::immediate(max_attempts),
            timeout,
        }
    }
}

impl<B, P> Retry<B, P> {
    /// 替换重试策略（例如加入退避）
    pub fn with_policy<Q: RetryPolicy>(self, policy: Q) -> Retry<B, Q> {
        Retry {
            balancer: self.balancer,
            policy,
            timeout: self.timeout,
        }
    }

    pub fn balancer(&self) -> &B {
        &self.balancer
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<B, P> Retry<B, P>
where
    P: RetryPolicy,
{
    pub async fn call<Req, Resp>(&self, request: Req) -> Result<Resp>
    where
        B: Balancer<Req, Resp>,
        Req: Clone,
    {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut attempt = 0usize;

        loop {
            attempt += 1;

            let result = match tokio::time::timeout_at(deadline, self.attempt(request.clone())).await
            {
                Ok(result) => result,
                Err(_) => {
                    let last = TodoError::transport(
                        ErrorCode::ConnectionTimeout,
                        "retry budget elapsed during attempt",
                    );
                    return Err(self.exhausted(attempt, start, last));
                }
            };

            let error = match result {
                Ok(response) => return Ok(response),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            if !self.policy.should_retry(attempt, &error) || Instant::now() >= deadline {
                return Err(self.exhausted(attempt, start, error));
            }

            debug!(attempt, error = %error, "attempt failed, retrying");

            let delay = self.policy.backoff_duration(attempt);
            if !delay.is_zero()
                && tokio::time::timeout_at(deadline, tokio::time::sleep(delay))
                    .await
                    .is_err()
            {
                return Err(self.exhausted(attempt, start, error));
            }
        }
    }

    async fn attempt<Req, Resp>(&self, request: Req) -> Result<Resp>
    where
        B: Balancer<Req, Resp>,
    {
        let endpoint = self.balancer.pick()?;
        endpoint.oneshot(request).await
    }

    fn exhausted(&self, attempts: usize, start: Instant, last: TodoError) -> TodoError {
        let elapsed = start.elapsed();
        warn!(
            attempts,
            elapsed_ms = elapsed.as_millis() as u64,
            error = %last,
            "retry budget exhausted"
        );
        TodoError::RetryExhausted {
            attempts,
            elapsed,
            last: Box::new(last),
        }
    }
}
