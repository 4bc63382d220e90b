use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::discovery::{DiscoveryConfig, HealthCheckConfig};
use crate::error::{Result, TodoError};
use crate::runtime::RuntimeConfig;

pub const ENV_HTTP_ADDR: &str = "TODOSVC_HTTP_ADDR";
pub const ENV_CONSUL_ADDR: &str = "CONSUL_HTTP_ADDR";
pub const ENV_LOG_JSON: &str = "TODOSVC_LOG_JSON";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: Option<RegistryConfig>,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_service_tags")]
    pub tags: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            tags: default_service_tags(),
        }
    }
}

fn default_service_name() -> String {
    crate::client::SERVICE_NAME.to_string()
}

fn default_service_tags() -> Vec<String> {
    crate::client::SERVICE_TAGS
        .iter()
        .map(|tag| tag.to_string())
        .collect()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_http_addr")]
    pub http_addr: String,
    /// 关闭超时（秒）
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
    /// 注销后继续接收请求的时间（毫秒）
    #[serde(default)]
    pub drain_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout: default_shutdown_timeout(),
            drain_delay_ms: 0,
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_shutdown_timeout() -> u64 {
    5
}

/// 服务注册配置（缺省时不注册）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// Consul agent 地址
    #[serde(default = "default_consul_addr")]
    pub consul_addr: String,
    /// 对外公布的地址（缺省使用监听地址）
    #[serde(default)]
    pub advertise_addr: Option<String>,
    #[serde(default)]
    pub health_check: HealthCheckConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            consul_addr: default_consul_addr(),
            advertise_addr: None,
            health_check: HealthCheckConfig::default(),
        }
    }
}

fn default_consul_addr() -> String {
    "http://localhost:8500".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 用环境变量覆盖配置
    pub fn apply_env(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    /// 覆盖逻辑与环境读取分开，便于测试
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup(ENV_HTTP_ADDR) {
            self.server.http_addr = addr;
        }
        if let Some(addr) = lookup(ENV_CONSUL_ADDR) {
            self.registry.get_or_insert_with(RegistryConfig::default).consul_addr = addr;
        }
        if let Some(json) = lookup(ENV_LOG_JSON) {
            self.log.json = matches!(json.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    pub fn http_addr(&self) -> Result<SocketAddr> {
        self.server.http_addr.parse().map_err(|e| {
            TodoError::config(format!("invalid http_addr {}: {}", self.server.http_addr, e))
        })
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig::default()
            .with_shutdown_timeout(Duration::from_secs(self.server.shutdown_timeout))
            .with_drain_delay(Duration::from_millis(self.server.drain_delay_ms))
    }

    /// 服务发现配置（未配置注册时为 None）
    pub fn discovery_config(&self) -> Option<DiscoveryConfig> {
        self.registry.as_ref().map(|registry| DiscoveryConfig {
            health_check: Some(registry.health_check.clone()),
            ..DiscoveryConfig::consul(registry.consul_addr.clone())
        })
    }
}
