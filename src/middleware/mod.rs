//! HTTP 中间件模块
//!
//! 客户端：单次尝试的超时；服务端：请求指标采集。

pub mod metrics;
pub mod timeout;

pub use metrics::track_metrics;
pub use timeout::{TimeoutLayer, into_todo_error};
