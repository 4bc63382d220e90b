//! 服务发现配置

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 逻辑服务标识：实例化器监听的对象
///
/// 每个客户端实例内不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceQuery {
    /// 服务名
    pub service: String,

    /// 必须携带的标签
    #[serde(default)]
    pub tags: Vec<String>,

    /// 是否只返回健康检查通过的实例
    #[serde(default = "default_passing_only")]
    pub passing_only: bool,
}

fn default_passing_only() -> bool {
    true
}

impl ServiceQuery {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            tags: Vec::new(),
            passing_only: true,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_passing_only(mut self, passing_only: bool) -> Self {
        self.passing_only = passing_only;
        self
    }
}

/// 后端类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    #[default]
    Consul,
    Memory,
}

impl std::str::FromStr for BackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "consul" => Ok(BackendType::Consul),
            "memory" | "inmemory" | "in-memory" => Ok(BackendType::Memory),
            _ => Err(format!("Unknown backend type: {}", s)),
        }
    }
}

/// 服务发现配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// 后端类型
    #[serde(default)]
    pub backend: BackendType,

    /// 后端地址（如 Consul agent 的 "http://localhost:8500"）
    #[serde(default = "default_consul_address")]
    pub address: String,

    /// 阻塞查询最长等待时间（秒）
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,

    /// 注册时附带的健康检查
    #[serde(default)]
    pub health_check: Option<HealthCheckConfig>,
}

fn default_consul_address() -> String {
    "http://localhost:8500".to_string()
}

fn default_wait_secs() -> u64 {
    10
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            backend: BackendType::Consul,
            address: default_consul_address(),
            wait_secs: default_wait_secs(),
            health_check: Some(HealthCheckConfig::default()),
        }
    }
}

impl DiscoveryConfig {
    pub fn consul(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }
}

/// 健康检查配置（注册实例时交给后端执行）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// 健康检查间隔（秒）
    pub interval: u64,

    /// 超时时间（秒）
    pub timeout: u64,

    /// 持续不健康多久后自动注销（秒）
    pub deregister_after: u64,

    /// 健康检查路径（HTTP）
    pub path: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval: 10,
            timeout: 5,
            deregister_after: 90,
            path: "/health".to_string(),
        }
    }
}
