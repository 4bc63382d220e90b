//! Todo 服务客户端
//!
//! 每个逻辑操作（创建/读取/更新/删除）各自拥有一套
//! 端点器 -> 轮询负载均衡 -> 重试 的调用栈，共享同一个实例化器。
//! 某个操作的失败或实例池变化不会影响其他操作。

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::discovery::{ConsulBackend, DiscoveryBackend, Endpointer, Instancer, ServiceQuery};
use crate::error::{Result, TodoError};
use crate::lb::{Retry, RoundRobin};
use crate::todo::{
    DeleteTodoRequest, DeleteTodoResponse, GetTodoRequest, GetTodoResponse, PostTodoRequest,
    PostTodoResponse, PutTodoRequest, PutTodoResponse, Todo, TodoService,
};
use crate::transport::HttpFactory;

/// 服务注册名
pub const SERVICE_NAME: &str = "todosvc";
/// 实例必须携带的标签
pub const SERVICE_TAGS: &[&str] = &["prod"];
/// 只使用健康检查通过的实例
pub const PASSING_ONLY: bool = true;
/// 每次逻辑调用最多尝试次数
pub const RETRY_MAX: usize = 3;
/// 每次逻辑调用的总时长预算
pub const RETRY_TIMEOUT: Duration = Duration::from_millis(500);
/// 单次尝试超时
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_millis(250);

/// 客户端构造参数，默认值即服务契约
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub query: ServiceQuery,
    pub max_attempts: usize,
    pub retry_timeout: Duration,
    pub attempt_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            query: ServiceQuery::new(SERVICE_NAME)
                .with_tags(SERVICE_TAGS.iter().copied())
                .with_passing_only(PASSING_ONLY),
            max_attempts: RETRY_MAX,
            retry_timeout: RETRY_TIMEOUT,
            attempt_timeout: ATTEMPT_TIMEOUT,
        }
    }
}

type Caller<Req, Resp> = Retry<RoundRobin<Endpointer<Req, Resp>>>;

fn caller<Req, Resp>(
    options: &ClientOptions,
    endpointer: Endpointer<Req, Resp>,
) -> Caller<Req, Resp> {
    Retry::new(
        options.max_attempts,
        options.retry_timeout,
        RoundRobin::new(endpointer),
    )
}

/// Todo 服务客户端
pub struct TodoClient {
    instancer: Instancer,
    post: Caller<PostTodoRequest, PostTodoResponse>,
    get: Caller<GetTodoRequest, GetTodoResponse>,
    put: Caller<PutTodoRequest, PutTodoResponse>,
    delete: Caller<DeleteTodoRequest, DeleteTodoResponse>,
}

impl TodoClient {
    /// 通过 Consul agent 发现服务实例
    pub async fn new(consul_addr: &str) -> Result<Self> {
        let backend = ConsulBackend::with_address(consul_addr)?;
        Self::with_backend(Arc::new(backend)).await
    }

    /// 使用任意服务发现后端
    pub async fn with_backend(backend: Arc<dyn DiscoveryBackend>) -> Result<Self> {
        Self::with_options(backend, ClientOptions::default()).await
    }

    pub async fn with_options(
        backend: Arc<dyn DiscoveryBackend>,
        options: ClientOptions,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| TodoError::config(format!("failed to build http client: {}", e)))?;

        let instancer = Instancer::new(backend, options.query.clone()).await;

        let attempt_timeout = options.attempt_timeout;
        let post = caller(
            &options,
            Endpointer::new(&instancer, HttpFactory::post_todo(http.clone(), attempt_timeout)),
        );
        let get = caller(
            &options,
            Endpointer::new(&instancer, HttpFactory::get_todo(http.clone(), attempt_timeout)),
        );
        let put = caller(
            &options,
            Endpointer::new(&instancer, HttpFactory::put_todo(http.clone(), attempt_timeout)),
        );
        let delete = caller(
            &options,
            Endpointer::new(&instancer, HttpFactory::delete_todo(http, attempt_timeout)),
        );

        info!(
            service = %options.query.service,
            instances = instancer.current().len(),
            "todo client ready"
        );

        Ok(Self {
            instancer,
            post,
            get,
            put,
            delete,
        })
    }

    /// 当前发现的实例位置
    pub fn instances(&self) -> Vec<String> {
        self.instancer.current()
    }

    /// 停止服务发现，之后的调用只使用已有的实例池
    pub fn stop(&self) {
        self.instancer.stop();
    }
}

#[async_trait]
impl TodoService for TodoClient {
    async fn post_todo(&self, todo: Todo) -> Result<()> {
        self.post
            .call(PostTodoRequest { todo })
            .await?
            .map_err(TodoError::from)
    }

    async fn get_todo(&self, id: &str) -> Result<Todo> {
        let request = GetTodoRequest { id: id.to_string() };
        self.get.call(request).await?.map_err(TodoError::from)
    }

    async fn put_todo(&self, id: &str, todo: Todo) -> Result<()> {
        let request = PutTodoRequest {
            id: id.to_string(),
            todo,
        };
        self.put.call(request).await?.map_err(TodoError::from)
    }

    async fn delete_todo(&self, id: &str) -> Result<()> {
        let request = DeleteTodoRequest { id: id.to_string() };
        self.delete.call(request).await?.map_err(TodoError::from)
    }
}
