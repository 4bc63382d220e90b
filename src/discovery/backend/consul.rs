//! Consul 服务发现后端

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::discovery::{
    DiscoveryBackend, DiscoveryConfig, HealthCheckConfig, Lookup, ServiceInstance, ServiceQuery,
};
use crate::error::{Result, TodoError};

/// `/v1/health/service/:name` 返回的条目
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HealthEntry {
    node: NodeEntry,
    service: ServiceEntry,
    #[serde(default)]
    checks: Vec<CheckEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeEntry {
    #[serde(default)]
    address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceEntry {
    #[serde(rename = "ID")]
    id: String,
    service: String,
    #[serde(default)]
    address: String,
    port: u16,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CheckEntry {
    status: String,
}

impl HealthEntry {
    fn into_instance(self) -> ServiceInstance {
        // 服务未声明地址时使用节点地址
        let address = if self.service.address.is_empty() {
            self.node.address
        } else {
            self.service.address
        };
        let healthy = self.checks.iter().all(|c| c.status == "passing");

        ServiceInstance {
            service_name: self.service.service,
            instance_id: self.service.id,
            address,
            port: self.service.port,
            tags: self.service.tags.unwrap_or_default(),
            healthy,
        }
    }
}

/// Consul 服务发现后端
pub struct ConsulBackend {
    http_client: HttpClient,
    consul_url: String,
    wait: Duration,
    health_check: Option<HealthCheckConfig>,
}

impl ConsulBackend {
    /// 创建新的 Consul 后端
    pub fn new(config: &DiscoveryConfig) -> Result<Self> {
        let consul_url = normalize_url(&config.address);
        let http_client = HttpClient::builder()
            .build()
            .map_err(|e| TodoError::config(format!("failed to build consul client: {}", e)))?;

        Ok(Self {
            http_client,
            consul_url,
            wait: config.wait(),
            health_check: config.health_check.clone(),
        })
    }

    /// 使用默认配置连接指定地址的 Consul agent
    pub fn with_address(address: impl Into<String>) -> Result<Self> {
        Self::new(&DiscoveryConfig::consul(address))
    }

    pub fn url(&self) -> &str {
        &self.consul_url
    }

    /// 拼接 API 路径，每一段都做路径转义
    fn api_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.consul_url).map_err(|e| {
            TodoError::config(format!("invalid consul address {}: {}", self.consul_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                TodoError::config(format!("invalid consul address {}", self.consul_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn normalize_url(address: &str) -> String {
    let address = address.trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

#[async_trait]
impl DiscoveryBackend for ConsulBackend {
    async fn lookup(&self, query: &ServiceQuery, last_index: u64) -> Result<Lookup> {
        let url = self.api_url(&["v1", "health", "service", query.service.as_str()])?;

        // Consul 只支持按单个标签过滤，其余标签由实例化器在本地过滤
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(tag) = query.tags.first() {
            params.push(("tag", tag.clone()));
        }
        if query.passing_only {
            params.push(("passing", "true".to_string()));
        }
        if last_index > 0 {
            params.push(("index", last_index.to_string()));
            params.push(("wait", format!("{}s", self.wait.as_secs().max(1))));
        }

        let resp = self
            .http_client
            .get(url)
            .query(&params)
            .timeout(self.wait + Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| TodoError::discovery(format!("consul lookup failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(TodoError::discovery(format!(
                "consul lookup failed with status: {}",
                resp.status()
            )));
        }

        let index = resp
            .headers()
            .get("X-Consul-Index")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let entries: Vec<HealthEntry> = resp
            .json()
            .await
            .map_err(|e| TodoError::discovery(format!("invalid consul response: {}", e)))?;

        let instances: Vec<ServiceInstance> =
            entries.into_iter().map(HealthEntry::into_instance).collect();

        debug!(
            service = %query.service,
            index,
            count = instances.len(),
            "consul lookup completed"
        );

        Ok(Lookup { instances, index })
    }

    async fn register(&self, instance: &ServiceInstance) -> Result<()> {
        let url = self.api_url(&["v1", "agent", "service", "register"])?;

        // Consul 无法访问 0.0.0.0，注册为回环地址
        let service_address = match instance.address.as_str() {
            "" | "0.0.0.0" => "127.0.0.1".to_string(),
            "::" | "[::]" => "::1".to_string(),
            other => other.to_string(),
        };

        let mut payload = serde_json::json!({
            "ID": instance.instance_id,
            "Name": instance.service_name,
            "Tags": instance.tags,
            "Address": service_address,
            "Port": instance.port,
        });

        if let Some(check) = &self.health_check {
            let probe = ServiceInstance {
                address: service_address.clone(),
                ..instance.clone()
            };
            payload["Check"] = serde_json::json!({
                "HTTP": format!("{}{}", probe.to_http_url(), check.path),
                "Interval": format!("{}s", check.interval),
                "Timeout": format!("{}s", check.timeout),
                "DeregisterCriticalServiceAfter": format!("{}s", check.deregister_after),
            });
        }

        let resp = self
            .http_client
            .put(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TodoError::discovery(format!("consul register failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(TodoError::discovery(format!(
                "consul register failed with status {}: {}",
                status, body
            )));
        }

        info!(
            instance_id = %instance.instance_id,
            service = %instance.service_name,
            "registered with consul"
        );
        Ok(())
    }

    async fn deregister(&self, instance_id: &str) -> Result<()> {
        let url = self.api_url(&["v1", "agent", "service", "deregister", instance_id])?;
        let resp = self
            .http_client
            .put(url)
            .send()
            .await
            .map_err(|e| TodoError::discovery(format!("consul deregister failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(TodoError::discovery(format!(
                "consul deregister failed with status: {}",
                resp.status()
            )));
        }
        Ok(())
    }
}
