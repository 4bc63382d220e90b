//! 实例化器：把逻辑服务标识解析为当前健康的网络位置集合
//!
//! 构造时立即查询一次，随后在后台循环执行阻塞查询；位置集合变化时通过
//! `watch` 通道推送给订阅者。后端出错时保留上一次成功的结果，只打日志。

use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::discovery::{DiscoveryBackend, ServiceInstance, ServiceQuery};
use crate::retry::{ExponentialBackoffPolicy, RetryPolicy};

use std::time::Duration;

const ERROR_BACKOFF_BASE: Duration = Duration::from_millis(50);
const ERROR_BACKOFF_MAX: Duration = Duration::from_secs(5);

/// 服务实例化器
pub struct Instancer {
    query: ServiceQuery,
    rx: watch::Receiver<Vec<String>>,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl Instancer {
    /// 创建实例化器并启动后台监听
    ///
    /// 首次查询失败不会返回错误：此时位置集合为空，后台循环会继续重试。
    pub async fn new(backend: Arc<dyn DiscoveryBackend>, query: ServiceQuery) -> Self {
        let (initial, index) = match backend.lookup(&query, 0).await {
            Ok(lookup) => (locations(&query, lookup.instances), lookup.index),
            Err(e) => {
                warn!(
                    service = %query.service,
                    error = %e,
                    "initial discovery lookup failed"
                );
                (Vec::new(), 0)
            }
        };

        info!(
            service = %query.service,
            tags = ?query.tags,
            instances = initial.len(),
            "instancer started"
        );

        let (tx, rx) = watch::channel(initial);
        let cancel = CancellationToken::new();

        tokio::spawn(watch_loop(
            backend,
            query.clone(),
            tx,
            index,
            cancel.clone(),
        ));

        Self {
            query,
            rx,
            _guard: cancel.clone().drop_guard(),
            cancel,
        }
    }

    /// 订阅位置集合的变化（订阅时的当前值视为已读）
    pub fn subscribe(&self) -> watch::Receiver<Vec<String>> {
        let mut rx = self.rx.clone();
        rx.mark_unchanged();
        rx
    }

    /// 当前健康的位置集合（已排序）
    pub fn current(&self) -> Vec<String> {
        self.rx.borrow().clone()
    }

    pub fn query(&self) -> &ServiceQuery {
        &self.query
    }

    /// 停止后台监听，订阅者的 `changed()` 随后返回错误
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// 过滤实例并转换为排序去重后的 host:port 列表
fn locations(query: &ServiceQuery, instances: Vec<ServiceInstance>) -> Vec<String> {
    let mut locations: Vec<String> = instances
        .iter()
        .filter(|inst| inst.matches_tags(&query.tags))
        .filter(|inst| !query.passing_only || inst.healthy)
        .map(ServiceInstance::location)
        .collect();
    locations.sort();
    locations.dedup();
    locations
}

async fn watch_loop(
    backend: Arc<dyn DiscoveryBackend>,
    query: ServiceQuery,
    tx: watch::Sender<Vec<String>>,
    mut index: u64,
    cancel: CancellationToken,
) {
    let backoff = ExponentialBackoffPolicy::unbounded(ERROR_BACKOFF_BASE, ERROR_BACKOFF_MAX);
    let mut failures = 0usize;

    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = backend.lookup(&query, index) => result,
        };

        match result {
            Ok(lookup) => {
                failures = 0;
                // 序号回退时重新做一次非阻塞查询
                index = match lookup.index {
                    i if i < index => 0,
                    0 => 1,
                    i => i,
                };

                let next = locations(&query, lookup.instances);
                let count = next.len();
                let changed = tx.send_if_modified(|current| {
                    if *current == next {
                        false
                    } else {
                        *current = next;
                        true
                    }
                });
                if changed {
                    info!(
                        service = %query.service,
                        instances = count,
                        "service instances changed"
                    );
                }
            }
            Err(e) => {
                failures += 1;
                let delay = backoff.backoff_duration(failures);
                warn!(
                    service = %query.service,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "discovery lookup failed, keeping last known instances"
                );
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    debug!(service = %query.service, "instancer stopped");
}
