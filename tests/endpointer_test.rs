//! 端点器测试

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tower::util::BoxCloneSyncService;
use tower::{ServiceExt, service_fn};

use todo_svc::{Closer, Endpoint, EndpointSource, Endpointer, ErrorCode, Result, TodoError};

use common::wait_until;

/// 记录创建和释放的工厂
#[derive(Clone, Default)]
struct Recorder {
    made: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn factory(&self) -> impl Fn(&str) -> Result<(Endpoint<(), String>, Option<Closer>)> + Send + Sync + 'static {
        let made = self.made.clone();
        let closed = self.closed.clone();
        move |location: &str| {
            if location.starts_with("bad") {
                return Err(TodoError::transport(
                    ErrorCode::InvalidLocation,
                    format!("cannot dial {}", location),
                ));
            }
            made.lock().unwrap().push(location.to_string());

            let answer = location.to_string();
            let endpoint = BoxCloneSyncService::new(service_fn(move |_: ()| {
                let answer = answer.clone();
                async move { Ok::<_, TodoError>(answer) }
            }));

            let closed = closed.clone();
            let gone = location.to_string();
            let closer: Closer = Box::new(move || closed.lock().unwrap().push(gone));
            Ok((endpoint, Some(closer)))
        }
    }

    fn made(&self) -> Vec<String> {
        self.made.lock().unwrap().clone()
    }

    fn closed(&self) -> Vec<String> {
        self.closed.lock().unwrap().clone()
    }
}

fn locations(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

async fn answers(source: &impl EndpointSource<(), String>) -> Vec<String> {
    let mut out = Vec::new();
    for endpoint in source.endpoints().iter() {
        out.push(endpoint.clone().oneshot(()).await.unwrap());
    }
    out.sort();
    out
}

#[tokio::test]
async fn applies_symmetric_difference() {
    let recorder = Recorder::default();
    let (_tx, rx) = watch::channel(locations(&["a:1", "b:2"]));
    let endpointer = Endpointer::from_receiver(rx, recorder.factory());

    assert_eq!(endpointer.len(), 2);
    assert_eq!(answers(&endpointer).await, locations(&["a:1", "b:2"]));

    endpointer.update(&locations(&["b:2", "c:3"]));

    assert_eq!(endpointer.locations(), locations(&["b:2", "c:3"]));
    assert_eq!(answers(&endpointer).await, locations(&["b:2", "c:3"]));
    assert_eq!(recorder.closed(), locations(&["a:1"]));
    // b:2 保留原来的 Endpoint，不重新创建
    assert_eq!(recorder.made(), locations(&["a:1", "b:2", "c:3"]));
}

#[tokio::test]
async fn pool_size_tracks_every_event() {
    let recorder = Recorder::default();
    let (_tx, rx) = watch::channel(Vec::new());
    let endpointer = Endpointer::from_receiver(rx, recorder.factory());

    let events: &[&[&str]] = &[
        &["a:1"],
        &["a:1", "b:2", "c:3"],
        &["c:3"],
        &[],
        &["d:4", "e:5"],
        &["a:1", "d:4", "e:5", "f:6"],
        &["f:6"],
    ];

    for event in events {
        endpointer.update(&locations(event));
        assert_eq!(endpointer.len(), event.len());
        assert_eq!(endpointer.locations(), locations(event));
    }

    let made = recorder.made().len();
    let closed = recorder.closed().len();
    assert_eq!(made - closed, 1);
}

#[tokio::test]
async fn factory_failures_are_skipped() {
    let recorder = Recorder::default();
    let (_tx, rx) = watch::channel(locations(&["a:1", "bad:0", "b:2"]));
    let endpointer = Endpointer::from_receiver(rx, recorder.factory());

    assert_eq!(endpointer.locations(), locations(&["a:1", "b:2"]));
}

#[tokio::test]
async fn follows_location_channel() {
    let recorder = Recorder::default();
    let (tx, rx) = watch::channel(locations(&["a:1"]));
    let endpointer = Arc::new(Endpointer::from_receiver(rx, recorder.factory()));

    tx.send(locations(&["a:1", "b:2"])).unwrap();
    let e = endpointer.clone();
    wait_until("pool to grow", move || {
        let e = e.clone();
        async move { e.len() == 2 }
    })
    .await;

    tx.send(Vec::new()).unwrap();
    let e = endpointer.clone();
    wait_until("pool to drain", move || {
        let e = e.clone();
        async move { e.is_empty() }
    })
    .await;

    assert_eq!(recorder.closed().len(), 2);
}

#[tokio::test]
async fn readers_keep_their_snapshot() {
    let recorder = Recorder::default();
    let (_tx, rx) = watch::channel(locations(&["a:1", "b:2"]));
    let endpointer = Endpointer::from_receiver(rx, recorder.factory());

    let snapshot = endpointer.endpoints();
    endpointer.update(&[]);

    // 旧快照仍完整可用，新快照为空
    assert_eq!(snapshot.len(), 2);
    for endpoint in snapshot.iter() {
        assert!(endpoint.clone().oneshot(()).await.is_ok());
    }
    assert!(endpointer.endpoints().is_empty());
}

#[tokio::test]
async fn drop_releases_all_endpoints() {
    let recorder = Recorder::default();
    let (_tx, rx) = watch::channel(locations(&["a:1", "b:2", "c:3"]));
    let endpointer = Endpointer::from_receiver(rx, recorder.factory());

    drop(endpointer);

    let mut closed = recorder.closed();
    closed.sort();
    assert_eq!(closed, locations(&["a:1", "b:2", "c:3"]));
}

#[tokio::test]
async fn close_releases_and_ignores_later_updates() {
    let recorder = Recorder::default();
    let (tx, rx) = watch::channel(locations(&["a:1", "b:2"]));
    let endpointer = Endpointer::from_receiver(rx, recorder.factory());

    endpointer.close();
    assert!(endpointer.is_closed());
    assert!(endpointer.is_empty());
    assert_eq!(recorder.closed().len(), 2);

    let _ = tx.send(locations(&["c:3"]));
    endpointer.update(&locations(&["d:4"]));
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(endpointer.is_empty());
    assert!(endpointer.locations().is_empty());
    assert_eq!(recorder.made(), locations(&["a:1", "b:2"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pending_update_cannot_reopen_closed_pool() {
    for _ in 0..200 {
        let recorder = Recorder::default();
        let (tx, rx) = watch::channel(Vec::new());
        let endpointer = Endpointer::from_receiver(rx, recorder.factory());

        tx.send(locations(&["a:1", "b:2"])).unwrap();
        endpointer.close();
        tokio::time::sleep(Duration::from_millis(2)).await;

        assert!(endpointer.is_empty());
        assert_eq!(recorder.made().len(), recorder.closed().len());
    }
}
