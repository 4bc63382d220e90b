//! 每个逻辑操作的请求/响应类型
//!
//! 响应是 `Result<_, ServiceError>`：业务错误作为成功传输结果的一部分返回，
//! 与传输层错误在类型上就分开，重试器永远不会把它们当作可重试失败。

use super::Todo;
use crate::error::ServiceError;

/// 创建 Todo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostTodoRequest {
    pub todo: Todo,
}

pub type PostTodoResponse = Result<(), ServiceError>;

/// 读取 Todo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetTodoRequest {
    pub id: String,
}

pub type GetTodoResponse = Result<Todo, ServiceError>;

/// 更新 Todo（路径中的 id 必须与 body 中的 id 一致）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutTodoRequest {
    pub id: String,
    pub todo: Todo,
}

pub type PutTodoResponse = Result<(), ServiceError>;

/// 删除 Todo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTodoRequest {
    pub id: String,
}

pub type DeleteTodoResponse = Result<(), ServiceError>;
