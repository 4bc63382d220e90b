//! 服务实例定义

use serde::{Deserialize, Serialize};

/// 服务实例
///
/// 由服务发现后端产生和回收；客户端核心只消费它的网络位置。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInstance {
    /// 逻辑服务名（如 "todosvc"）
    pub service_name: String,

    /// 实例 ID（唯一标识）
    pub instance_id: String,

    /// 主机地址（IP 或主机名）
    pub address: String,

    /// 端口
    pub port: u16,

    /// 标签（用于过滤）
    pub tags: Vec<String>,

    /// 是否通过健康检查
    pub healthy: bool,
}

impl ServiceInstance {
    /// 创建新的服务实例（默认健康）
    pub fn new(
        service_name: impl Into<String>,
        instance_id: impl Into<String>,
        address: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            instance_id: instance_id.into(),
            address: address.into(),
            port,
            tags: Vec::new(),
            healthy: true,
        }
    }

    /// 添加标签
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// 设置健康状态
    pub fn with_health(mut self, healthy: bool) -> Self {
        self.healthy = healthy;
        self
    }

    /// 网络位置（host:port）
    pub fn location(&self) -> String {
        if self.address.contains(':') && !self.address.starts_with('[') {
            // IPv6 字面量
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }

    /// 转换为 HTTP URL
    pub fn to_http_url(&self) -> String {
        format!("http://{}", self.location())
    }

    /// 是否携带全部要求的标签
    pub fn matches_tags<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required
            .iter()
            .all(|tag| self.tags.iter().any(|t| t == tag.as_ref()))
    }
}
