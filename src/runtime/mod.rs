//! 服务运行时
//!
//! 统一管理 HTTP 服务的生命周期：绑定监听、就绪检查、服务注册、
//! 等待关闭信号、注销、优雅停机。
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use todo_svc::runtime::ServiceRuntime;
//! use todo_svc::{HealthService, InMemoryTodoService, MetricsCollector, make_http_handler};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let health = HealthService::new();
//! let router = make_http_handler(
//!     Arc::new(InMemoryTodoService::new()),
//!     health.clone(),
//!     MetricsCollector::new(),
//! );
//!
//! ServiceRuntime::new("todosvc", "0.0.0.0:8000".parse()?)
//!     .with_health(health)
//!     .run(router)
//!     .await
//! # }
//! ```

pub mod config;
pub mod runtime;

pub use config::RuntimeConfig;
pub use runtime::ServiceRuntime;
