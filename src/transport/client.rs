//! HTTP 客户端：每个逻辑操作一次往返，以及 Endpoint 工厂

use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use std::time::Duration;
use tower::util::BoxCloneSyncService;
use tower::{Layer, service_fn};

use crate::endpoint::{Closer, Endpoint, Factory};
use crate::error::{ErrorCode, Result, ServiceError, TodoError};
use crate::middleware::TimeoutLayer;
use crate::todo::{
    DeleteTodoRequest, DeleteTodoResponse, GetTodoRequest, GetTodoResponse, PostTodoRequest,
    PostTodoResponse, PutTodoRequest, PutTodoResponse, Todo,
};

/// 针对某个基础地址的一次 HTTP 往返
pub type RoundTrip<Req, Resp> = fn(Client, Url, Req) -> BoxFuture<'static, Result<Resp>>;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// 把网络位置解析为基础 URL，没有 scheme 时补上 `http://`
pub fn parse_location(location: &str) -> Result<Url> {
    let raw = if location.contains("://") {
        location.to_string()
    } else {
        format!("http://{}", location)
    };
    Url::parse(&raw).map_err(|e| {
        TodoError::transport(
            ErrorCode::InvalidLocation,
            format!("invalid location {}: {}", location, e),
        )
    })
}

/// `{base}/todo/` 或 `{base}/todo/{id}`，id 做路径转义
fn todo_url(base: &Url, id: Option<&str>) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut segments = url.path_segments_mut().map_err(|_| {
            TodoError::transport(
                ErrorCode::InvalidLocation,
                format!("location cannot be a base url: {}", base),
            )
        })?;
        segments.pop_if_empty().push("todo");
        segments.push(id.unwrap_or(""));
    }
    Ok(url)
}

/// 解码响应
///
/// 2xx 解码为 `T`；非 2xx 且带 `{"error": ...}` 的是业务错误，随成功的传输结果
/// 返回；5xx 且无法解码的视为实例故障（可重试）；其余无法解码的是 `Decode`。
async fn decode<T: DeserializeOwned>(
    response: Response,
) -> Result<std::result::Result<T, ServiceError>> {
    let status = response.status();
    let body = response.bytes().await?;

    if status.is_success() {
        let value = serde_json::from_slice::<T>(&body)?;
        return Ok(Ok(value));
    }

    match serde_json::from_slice::<ErrorBody>(&body) {
        Ok(err) => Ok(Err(ServiceError::from_message(&err.error))),
        Err(_) if status.is_server_error() => Err(TodoError::transport(
            ErrorCode::ServiceUnavailable,
            format!("server responded {}", status),
        )),
        Err(e) => Err(TodoError::Decode(format!(
            "unexpected response {}: {}",
            status, e
        ))),
    }
}

async fn decode_empty(response: Response) -> Result<std::result::Result<(), ServiceError>> {
    Ok(decode::<IgnoredAny>(response).await?.map(|_| ()))
}

fn post_todo(
    client: Client,
    base: Url,
    req: PostTodoRequest,
) -> BoxFuture<'static, Result<PostTodoResponse>> {
    async move {
        let url = todo_url(&base, None)?;
        let response = client.post(url).json(&req.todo).send().await?;
        decode_empty(response).await
    }
    .boxed()
}

fn get_todo(
    client: Client,
    base: Url,
    req: GetTodoRequest,
) -> BoxFuture<'static, Result<GetTodoResponse>> {
    async move {
        let url = todo_url(&base, Some(&req.id))?;
        let response = client.get(url).send().await?;
        decode::<Todo>(response).await
    }
    .boxed()
}

fn put_todo(
    client: Client,
    base: Url,
    req: PutTodoRequest,
) -> BoxFuture<'static, Result<PutTodoResponse>> {
    async move {
        let url = todo_url(&base, Some(&req.id))?;
        let response = client.put(url).json(&req.todo).send().await?;
        decode_empty(response).await
    }
    .boxed()
}

fn delete_todo(
    client: Client,
    base: Url,
    req: DeleteTodoRequest,
) -> BoxFuture<'static, Result<DeleteTodoResponse>> {
    async move {
        let url = todo_url(&base, Some(&req.id))?;
        let response = client.delete(url).send().await?;
        decode_empty(response).await
    }
    .boxed()
}

/// HTTP Endpoint 工厂
///
/// 每个位置构建一个 Endpoint，外层套单次尝试的超时。reqwest 的连接池由
/// 共享的 `Client` 管理，位置下线时不需要额外的释放动作。
pub struct HttpFactory<Req, Resp> {
    client: Client,
    round_trip: RoundTrip<Req, Resp>,
    timeout: Duration,
}

impl<Req, Resp> HttpFactory<Req, Resp> {
    pub fn new(client: Client, round_trip: RoundTrip<Req, Resp>, timeout: Duration) -> Self {
        Self {
            client,
            round_trip,
            timeout,
        }
    }
}

impl HttpFactory<PostTodoRequest, PostTodoResponse> {
    pub fn post_todo(client: Client, timeout: Duration) -> Self {
        Self::new(client, post_todo, timeout)
    }
}

impl HttpFactory<GetTodoRequest, GetTodoResponse> {
    pub fn get_todo(client: Client, timeout: Duration) -> Self {
        Self::new(client, get_todo, timeout)
    }
}

impl HttpFactory<PutTodoRequest, PutTodoResponse> {
    pub fn put_todo(client: Client, timeout: Duration) -> Self {
        Self::new(client, put_todo, timeout)
    }
}

impl HttpFactory<DeleteTodoRequest, DeleteTodoResponse> {
    pub fn delete_todo(client: Client, timeout: Duration) -> Self {
        Self::new(client, delete_todo, timeout)
    }
}

impl<Req, Resp> Factory<Req, Resp> for HttpFactory<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    fn make(&self, location: &str) -> Result<(Endpoint<Req, Resp>, Option<Closer>)> {
        let base = parse_location(location)?;
        let client = self.client.clone();
        let round_trip = self.round_trip;

        let service = service_fn(move |req: Req| round_trip(client.clone(), base.clone(), req));
        let service = TimeoutLayer::new(self.timeout).layer(service);

        Ok((BoxCloneSyncService::new(service), None))
    }
}
