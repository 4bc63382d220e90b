use super::RetryPolicy;
use crate::error::TodoError;
use std::time::Duration;

/// 指数退避重试策略
#[derive(Debug, Clone)]
pub struct ExponentialBackoffPolicy {
    max_attempts: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl ExponentialBackoffPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// 不限次数，只用于计算退避间隔（如服务发现的重连）
    pub fn unbounded(base_delay: Duration, max_delay: Duration) -> Self {
        Self::new(usize::MAX, base_delay, max_delay)
    }
}

impl RetryPolicy for ExponentialBackoffPolicy {
    fn should_retry(&self, attempt: usize, error: &TodoError) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }

        error.is_retryable()
    }

    fn backoff_duration(&self, attempt: usize) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(10);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}
