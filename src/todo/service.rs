//! Todo 服务抽象与内存实现

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::Todo;
use crate::error::{Result, ServiceError};

/// Todo 服务接口
///
/// 服务端由 [`InMemoryTodoService`] 实现，客户端由 [`crate::client::TodoClient`] 实现，
/// 两边对调用方暴露同一套语义。
#[async_trait]
pub trait TodoService: Send + Sync {
    /// 创建 Todo，id 已存在时返回 `AlreadyExists`
    async fn post_todo(&self, todo: Todo) -> Result<()>;

    /// 读取 Todo，不存在时返回 `NotFound`
    async fn get_todo(&self, id: &str) -> Result<Todo>;

    /// 创建或覆盖 Todo，`id` 与 `todo.id` 不一致时返回 `InconsistentId`
    async fn put_todo(&self, id: &str, todo: Todo) -> Result<()>;

    /// 删除 Todo，不存在时返回 `NotFound`
    async fn delete_todo(&self, id: &str) -> Result<()>;
}

/// 内存 Todo 存储
///
/// 由调用方显式持有并注入到 HTTP 层，不使用进程级单例。
#[derive(Clone, Default)]
pub struct InMemoryTodoService {
    todos: Arc<RwLock<HashMap<String, Todo>>>,
}

impl InMemoryTodoService {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前记录数
    pub async fn len(&self) -> usize {
        self.todos.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.todos.read().await.is_empty()
    }
}

#[async_trait]
impl TodoService for InMemoryTodoService {
    async fn post_todo(&self, todo: Todo) -> Result<()> {
        let mut todos = self.todos.write().await;
        if todos.contains_key(&todo.id) {
            return Err(ServiceError::AlreadyExists.into());
        }
        debug!(id = %todo.id, "todo created");
        todos.insert(todo.id.clone(), todo);
        Ok(())
    }

    async fn get_todo(&self, id: &str) -> Result<Todo> {
        let todos = self.todos.read().await;
        todos
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound.into())
    }

    async fn put_todo(&self, id: &str, todo: Todo) -> Result<()> {
        if id != todo.id {
            return Err(ServiceError::InconsistentId.into());
        }
        let mut todos = self.todos.write().await;
        debug!(id = %id, "todo stored");
        todos.insert(id.to_string(), todo);
        Ok(())
    }

    async fn delete_todo(&self, id: &str) -> Result<()> {
        let mut todos = self.todos.write().await;
        if todos.remove(id).is_none() {
            return Err(ServiceError::NotFound.into());
        }
        debug!(id = %id, "todo deleted");
        Ok(())
    }
}
