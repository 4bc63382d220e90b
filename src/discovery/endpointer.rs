//! 端点器：维护 位置 -> Endpoint 的实例池
//!
//! 写入方（发现事件）在互斥锁下按批次应用差异，然后整体替换一份不可变
//! 快照；读取方（负载均衡器）只读快照，不会阻塞写入方，也不会看到只
//! 更新了一半的池。

use arc_swap::ArcSwap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::discovery::Instancer;
use crate::endpoint::{Closer, Endpoint, EndpointSource, Factory};

struct PoolEntry<Req, Resp> {
    endpoint: Endpoint<Req, Resp>,
    closer: Option<Closer>,
}

struct PoolState<Req, Resp> {
    entries: BTreeMap<String, PoolEntry<Req, Resp>>,
    /// 关闭后不再接受任何更新
    closed: bool,
}

struct Pool<Req, Resp> {
    factory: Box<dyn Factory<Req, Resp>>,
    state: Mutex<PoolState<Req, Resp>>,
    snapshot: ArcSwap<Vec<Endpoint<Req, Resp>>>,
}

impl<Req, Resp> Pool<Req, Resp>
where
    Req: 'static,
    Resp: 'static,
{
    fn apply(&self, locations: &[String]) {
        let wanted: BTreeSet<&str> = locations.iter().map(String::as_str).collect();
        let mut closers = Vec::new();

        let (added, removed, size) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.closed {
                debug!("endpoint pool closed, ignoring update");
                return;
            }
            let entries = &mut state.entries;

            let before = entries.len();
            entries.retain(|location, entry| {
                let keep = wanted.contains(location.as_str());
                if !keep {
                    closers.extend(entry.closer.take());
                }
                keep
            });
            let removed = before - entries.len();

            let mut added = 0usize;
            for location in wanted {
                if entries.contains_key(location) {
                    continue;
                }
                match self.factory.make(location) {
                    Ok((endpoint, closer)) => {
                        entries.insert(location.to_string(), PoolEntry { endpoint, closer });
                        added += 1;
                    }
                    Err(e) => {
                        warn!(location, error = %e, "failed to create endpoint, skipping");
                    }
                }
            }

            let snapshot: Vec<_> = entries.values().map(|e| e.endpoint.clone()).collect();
            self.snapshot.store(Arc::new(snapshot));
            (added, removed, entries.len())
        };

        // 快照替换之后才释放下线位置的资源
        for closer in closers {
            closer();
        }

        if added > 0 || removed > 0 {
            info!(added, removed, size, "endpoint pool updated");
        }
    }

    fn locations(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .keys()
            .cloned()
            .collect()
    }
}

impl<Req, Resp> Pool<Req, Resp> {
    /// 标记关闭并清空实例池，返回需要执行的释放动作
    fn shutdown(&self) -> Vec<Closer> {
        let closers = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.closed = true;
            let closers: Vec<Closer> = std::mem::take(&mut state.entries)
                .into_values()
                .filter_map(|e| e.closer)
                .collect();
            self.snapshot.store(Arc::new(Vec::new()));
            closers
        };
        if !closers.is_empty() {
            info!(released = closers.len(), "endpoint pool closed");
        }
        closers
    }
}

/// 端点器
pub struct Endpointer<Req, Resp> {
    pool: Arc<Pool<Req, Resp>>,
    cancel: CancellationToken,
}

impl<Req, Resp> Endpointer<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// 订阅实例化器并用工厂构建实例池
    pub fn new<F>(instancer: &Instancer, factory: F) -> Self
    where
        F: Factory<Req, Resp>,
    {
        Self::from_receiver(instancer.subscribe(), factory)
    }

    /// 从位置集合通道构建
    ///
    /// 通道的当前值立即生效；发送端关闭后实例池保持最后的状态。
    pub fn from_receiver<F>(mut rx: watch::Receiver<Vec<String>>, factory: F) -> Self
    where
        F: Factory<Req, Resp>,
    {
        let pool = Arc::new(Pool {
            factory: Box::new(factory),
            state: Mutex::new(PoolState {
                entries: BTreeMap::new(),
                closed: false,
            }),
            snapshot: ArcSwap::from_pointee(Vec::new()),
        });

        let initial = rx.borrow_and_update().clone();
        pool.apply(&initial);

        let cancel = CancellationToken::new();
        let task_pool = pool.clone();
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            debug!("location channel closed");
                            break;
                        }
                        let locations = rx.borrow_and_update().clone();
                        task_pool.apply(&locations);
                    }
                }
            }
        });

        Self { pool, cancel }
    }
}

impl<Req, Resp> Endpointer<Req, Resp>
where
    Req: 'static,
    Resp: 'static,
{
    /// 手动应用一批位置（与发现事件走同一路径）
    pub fn update(&self, locations: &[String]) {
        self.pool.apply(locations);
    }

    /// 当前实例池中的位置（已排序）
    pub fn locations(&self) -> Vec<String> {
        self.pool.locations()
    }

    pub fn len(&self) -> usize {
        self.pool.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 停止订阅并释放全部 Endpoint，之后的更新一律忽略
    pub fn close(&self) {
        self.cancel.cancel();
        for closer in self.pool.shutdown() {
            closer();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.pool
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }
}

impl<Req, Resp> EndpointSource<Req, Resp> for Endpointer<Req, Resp>
where
    Req: 'static,
    Resp: 'static,
{
    fn endpoints(&self) -> Arc<Vec<Endpoint<Req, Resp>>> {
        self.pool.snapshot.load_full()
    }
}

impl<Req, Resp> Drop for Endpointer<Req, Resp> {
    fn drop(&mut self) {
        self.cancel.cancel();
        for closer in self.pool.shutdown() {
            closer();
        }
    }
}
