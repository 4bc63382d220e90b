//! 客户端端到端测试：服务注册 -> 发现 -> 负载均衡 -> 重试

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use todo_svc::{
    ClientOptions, DiscoveryBackend, ErrorCode, HealthService, InMemoryBackend,
    InMemoryTodoService, MetricsCollector, RuntimeConfig, ServiceError, ServiceInstance,
    ServiceRuntime, Todo, TodoClient, TodoError, TodoService, make_http_handler,
};

use common::{TestServer, closed_port, wait_until};

fn backend() -> Arc<InMemoryBackend> {
    Arc::new(InMemoryBackend::with_wait(Duration::from_millis(100)))
}

fn instance(id: &str, port: u16) -> ServiceInstance {
    ServiceInstance::new("todosvc", id, "127.0.0.1", port).with_tag("prod")
}

/// 通过 ServiceRuntime 启动并注册的实例
struct RegisteredServer {
    metrics: MetricsCollector,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl RegisteredServer {
    async fn start(
        id: &str,
        store: Arc<InMemoryTodoService>,
        backend: Arc<InMemoryBackend>,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let health = HealthService::new();
        let metrics = MetricsCollector::new();
        let router = make_http_handler(store, health.clone(), metrics.clone());

        let runtime = ServiceRuntime::new("todosvc", addr)
            .with_config(RuntimeConfig::default().with_shutdown_timeout(Duration::from_secs(1)))
            .with_health(health)
            .with_registration(backend, instance(id, addr.port()));

        let (shutdown, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(runtime.run_with_listener(listener, router, async move {
            let _ = rx.await;
        }));

        Self {
            metrics,
            shutdown,
            handle,
        }
    }

    async fn stop(self) {
        let _ = self.shutdown.send(());
        self.handle.await.unwrap().unwrap();
    }
}

async fn wait_registered(backend: &Arc<InMemoryBackend>, count: usize) {
    wait_until("instances to register", || {
        let registered = backend.instances().len();
        async move { registered == count }
    })
    .await;
}

fn service_error(err: &TodoError) -> Option<&ServiceError> {
    err.as_service()
}

#[tokio::test]
async fn crud_through_discovered_instances() {
    let backend = backend();
    let store = Arc::new(InMemoryTodoService::new());
    let first = RegisteredServer::start("todosvc-1", store.clone(), backend.clone()).await;
    let second = RegisteredServer::start("todosvc-2", store.clone(), backend.clone()).await;
    wait_registered(&backend, 2).await;

    let client = TodoClient::with_backend(backend.clone()).await.unwrap();
    assert_eq!(client.instances().len(), 2);

    client
        .post_todo(Todo::new("1", "write tests"))
        .await
        .unwrap();

    let err = client
        .post_todo(Todo::new("1", "write tests"))
        .await
        .unwrap_err();
    assert_eq!(service_error(&err), Some(&ServiceError::AlreadyExists));
    assert_eq!(err.status_code().as_u16(), 400);

    let todo = client.get_todo("1").await.unwrap();
    assert_eq!(todo, Todo::new("1", "write tests"));

    let done = Todo::new("1", "write tests").with_completed(true);
    client.put_todo("1", done.clone()).await.unwrap();
    assert_eq!(client.get_todo("1").await.unwrap(), done);

    let err = client.put_todo("2", done).await.unwrap_err();
    assert_eq!(service_error(&err), Some(&ServiceError::InconsistentId));

    client.delete_todo("1").await.unwrap();

    let err = client.get_todo("1").await.unwrap_err();
    assert_eq!(service_error(&err), Some(&ServiceError::NotFound));
    assert_eq!(err.status_code().as_u16(), 404);

    let err = client.delete_todo("1").await.unwrap_err();
    assert_eq!(service_error(&err), Some(&ServiceError::NotFound));

    // 请求在两个实例之间轮询
    let first_total = first.metrics.snapshot().await.requests_total;
    let second_total = second.metrics.snapshot().await.requests_total;
    assert!(first_total > 0 && second_total > 0);

    first.stop().await;
    second.stop().await;
    assert!(backend.instances().is_empty());
}

#[tokio::test]
async fn fails_over_from_dead_instance() {
    let backend = backend();
    let server = TestServer::start(Arc::new(InMemoryTodoService::new())).await;
    backend
        .register(&instance("live", server.addr.port()))
        .await
        .unwrap();
    backend
        .register(&instance("dead", closed_port().await))
        .await
        .unwrap();

    let client = TodoClient::with_backend(backend.clone()).await.unwrap();
    assert_eq!(client.instances().len(), 2);

    for i in 0..6 {
        client
            .post_todo(Todo::new(i.to_string(), "survives failover"))
            .await
            .unwrap();
    }
    assert_eq!(server.metrics.snapshot().await.requests_total, 6);

    server.stop().await;
}

#[tokio::test]
async fn empty_pool_exhausts_retries() {
    let backend = backend();
    let client = TodoClient::with_backend(backend).await.unwrap();

    let err = client.get_todo("1").await.unwrap_err();

    match err {
        TodoError::RetryExhausted { attempts, last, .. } => {
            assert_eq!(attempts, 3);
            assert_eq!(last.code(), ErrorCode::NoEndpoints);
        }
        other => panic!("expected RetryExhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn all_instances_down_is_bounded() {
    let backend = backend();
    backend
        .register(&instance("dead-1", closed_port().await))
        .await
        .unwrap();
    backend
        .register(&instance("dead-2", closed_port().await))
        .await
        .unwrap();

    let client = TodoClient::with_backend(backend).await.unwrap();
    let started = tokio::time::Instant::now();
    let err = client.get_todo("1").await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::RetryExhausted);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn unhealthy_instance_leaves_rotation() {
    let backend = backend();
    let store: Arc<InMemoryTodoService> = Arc::new(InMemoryTodoService::new());
    let healthy = TestServer::start(store.clone()).await;
    let sick = TestServer::start(store).await;
    backend
        .register(&instance("healthy", healthy.addr.port()))
        .await
        .unwrap();
    backend
        .register(&instance("sick", sick.addr.port()))
        .await
        .unwrap();

    let client = TodoClient::with_backend(backend.clone()).await.unwrap();
    assert_eq!(client.instances().len(), 2);

    backend.set_health("sick", false);
    wait_until("sick instance to leave", || {
        let count = client.instances().len();
        async move { count == 1 }
    })
    .await;
    // 端点器在实例化器之后异步更新
    tokio::time::sleep(Duration::from_millis(100)).await;

    let before = sick.metrics.snapshot().await.requests_total;
    for i in 0..4 {
        client
            .post_todo(Todo::new(i.to_string(), "healthy only"))
            .await
            .unwrap();
    }
    assert_eq!(sick.metrics.snapshot().await.requests_total, before);
    assert_eq!(healthy.metrics.snapshot().await.requests_total, 4);

    healthy.stop().await;
    sick.stop().await;
}

#[tokio::test]
async fn options_narrow_the_query() {
    let backend = backend();
    let server = TestServer::start(Arc::new(InMemoryTodoService::new())).await;
    backend
        .register(
            &ServiceInstance::new("todosvc", "canary", "127.0.0.1", server.addr.port())
                .with_tag("prod")
                .with_tag("canary"),
        )
        .await
        .unwrap();
    backend
        .register(&instance("plain", closed_port().await))
        .await
        .unwrap();

    let mut options = ClientOptions::default();
    options.query = options.query.with_tags(["prod", "canary"]);
    let client = TodoClient::with_options(backend, options).await.unwrap();

    assert_eq!(client.instances(), vec![server.location()]);
    client.post_todo(Todo::new("1", "canary")).await.unwrap();

    server.stop().await;
}
