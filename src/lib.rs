//! Todo Service Library
//!
//! 一个 Todo CRUD 微服务（HTTP + JSON），以及基于服务发现的客户端：
//! 实例化器跟踪健康实例，端点器把实例映射为可调用的 Endpoint，
//! 轮询负载均衡和有界重试组合在其上。

pub mod config;
pub mod error;
pub mod logging;

// 领域与传输
pub mod endpoint;
pub mod todo;
pub mod transport;

// 服务发现与客户端
pub mod client;
pub mod discovery;
pub mod lb;
pub mod retry;

// 服务端基础设施
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod runtime;
pub mod utils;

// Re-exports
pub use client::{ClientOptions, TodoClient};
pub use config::Config;
pub use endpoint::{Closer, Endpoint, EndpointSource, Factory, FixedEndpoints};
pub use error::{ErrorCategory, ErrorCode, Result, ServiceError, TodoError};
pub use todo::{InMemoryTodoService, Todo, TodoService};
pub use transport::{HttpFactory, make_http_handler};

pub use discovery::{
    BackendType, ConsulBackend, DiscoveryBackend, DiscoveryConfig, Endpointer,
    HealthCheckConfig, InMemoryBackend, Instancer, Lookup, ServiceInstance, ServiceQuery,
    ServiceRegistration,
};
pub use lb::{Balancer, Random, Retry, RoundRobin};
pub use retry::{ExponentialBackoffPolicy, FixedRetryPolicy, RetryPolicy};

pub use health::{HealthService, HealthStatus};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use runtime::{RuntimeConfig, ServiceRuntime};
