//! HTTP 传输层
//!
//! 服务端把路由映射到 [`TodoService`](crate::todo::TodoService)；客户端为每个
//! 逻辑操作提供一次 HTTP 往返，并由 [`HttpFactory`] 包装成 Endpoint。

pub mod client;
pub mod server;

pub use client::{HttpFactory, parse_location};
pub use server::{AppState, make_http_handler};
