//! 内存存储测试

use std::sync::Arc;

use tokio_test::{assert_err, assert_ok};
use todo_svc::{InMemoryTodoService, ServiceError, Todo, TodoError, TodoService};

fn service_error(err: TodoError) -> ServiceError {
    err.as_service().cloned().expect("expected a domain error")
}

#[tokio::test]
async fn post_then_get_returns_stored_record() {
    let store = InMemoryTodoService::new();
    let todo = Todo::new("1", "buy milk");

    assert_ok!(store.post_todo(todo.clone()).await);
    assert_eq!(store.get_todo("1").await.unwrap(), todo);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn post_duplicate_id_is_rejected() {
    let store = InMemoryTodoService::new();
    store.post_todo(Todo::new("1", "buy milk")).await.unwrap();

    let err = assert_err!(store.post_todo(Todo::new("1", "buy bread")).await);
    assert_eq!(service_error(err), ServiceError::AlreadyExists);

    // 原记录不被覆盖
    assert_eq!(store.get_todo("1").await.unwrap().text, "buy milk");
}

#[tokio::test]
async fn get_missing_is_not_found() {
    let store = InMemoryTodoService::new();
    let err = store.get_todo("nope").await.unwrap_err();
    assert_eq!(service_error(err), ServiceError::NotFound);
}

#[tokio::test]
async fn put_requires_matching_ids() {
    let store = InMemoryTodoService::new();

    let err = store
        .put_todo("2", Todo::new("1", "buy milk"))
        .await
        .unwrap_err();
    assert_eq!(service_error(err), ServiceError::InconsistentId);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn put_creates_and_replaces() {
    let store = InMemoryTodoService::new();

    store.put_todo("1", Todo::new("1", "buy milk")).await.unwrap();
    store
        .put_todo("1", Todo::new("1", "buy milk").with_completed(true))
        .await
        .unwrap();

    let todo = store.get_todo("1").await.unwrap();
    assert!(todo.completed);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let store = InMemoryTodoService::new();
    store.post_todo(Todo::new("1", "buy milk")).await.unwrap();

    assert_ok!(store.delete_todo("1").await);
    let err = store.get_todo("1").await.unwrap_err();
    assert_eq!(service_error(err), ServiceError::NotFound);

    let err = store.delete_todo("1").await.unwrap_err();
    assert_eq!(service_error(err), ServiceError::NotFound);
}

#[tokio::test]
async fn clones_share_the_same_records() {
    let store = InMemoryTodoService::new();
    let other = store.clone();

    store.post_todo(Todo::new("1", "buy milk")).await.unwrap();
    assert!(other.get_todo("1").await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_posts_with_same_id_admit_exactly_one() {
    let store = Arc::new(InMemoryTodoService::new());

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.post_todo(Todo::new("same", format!("writer {}", i))).await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => created += 1,
            Err(err) => assert_eq!(service_error(err), ServiceError::AlreadyExists),
        }
    }
    assert_eq!(created, 1);
}

#[test]
fn todo_uses_wire_field_names() {
    let todo = Todo::new("1", "buy milk");
    let value = serde_json::to_value(&todo).unwrap();
    assert_eq!(
        value,
        serde_json::json!({ "id": "1", "todo": "buy milk", "completed": false })
    );

    let parsed: Todo = serde_json::from_str(r#"{"id":"2","todo":"walk"}"#).unwrap();
    assert_eq!(parsed, Todo::new("2", "walk"));
}
