use super::RetryPolicy;
use crate::error::TodoError;
use std::time::Duration;

/// 固定延迟重试策略
#[derive(Debug, Clone)]
pub struct FixedRetryPolicy {
    max_attempts: usize,
    delay: Duration,
}

impl FixedRetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// 失败后立即重试（不等待）
    pub fn immediate(max_attempts: usize) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

impl RetryPolicy for FixedRetryPolicy {
    fn should_retry(&self, attempt: usize, error: &TodoError) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }

        // 业务错误和解码错误不重试
        error.is_retryable()
    }

    fn backoff_duration(&self, _attempt: usize) -> Duration {
        self.delay
    }

    fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}
