//! 运行时配置

use std::time::Duration;

/// 服务运行时配置
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// 优雅停机的最长等待时间，超时后强制中止 HTTP 服务
    pub shutdown_timeout: Duration,
    /// 注册前等待端口可连接的最长时间；`None` 表示跳过就绪检查
    pub ready_timeout: Option<Duration>,
    /// 注销之后、停止接收请求之前的等待时间，
    /// 让仍持有旧实例列表的客户端把请求发完
    pub drain_delay: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(5),
            ready_timeout: Some(Duration::from_secs(30)),
            drain_delay: Duration::ZERO,
        }
    }
}

impl RuntimeConfig {
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_ready_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.ready_timeout = timeout;
        self
    }

    pub fn with_drain_delay(mut self, delay: Duration) -> Self {
        self.drain_delay = delay;
        self
    }
}
