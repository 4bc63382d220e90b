//! Todo 领域模块
//!
//! 领域模型、服务抽象、内存存储以及每个操作的强类型请求/响应。

pub mod model;
pub mod request;
pub mod service;

pub use model::Todo;
pub use request::{
    DeleteTodoRequest, DeleteTodoResponse, GetTodoRequest, GetTodoResponse, PostTodoRequest,
    PostTodoResponse, PutTodoRequest, PutTodoResponse,
};
pub use service::{InMemoryTodoService, TodoService};
