//! HTTP 服务端：路由表与 JSON 编解码

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::error::{ServiceError, TodoError};
use crate::health::{HealthService, HealthStatus};
use crate::metrics::MetricsCollector;
use crate::middleware::track_metrics;
use crate::todo::{Todo, TodoService};

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn TodoService>,
    pub health: HealthService,
    pub metrics: MetricsCollector,
}

/// 构建 HTTP 路由
///
/// - `POST /todo/`
/// - `GET|PUT|DELETE /todo/{id}`
/// - `GET /health`、`GET /metrics`
pub fn make_http_handler(
    service: Arc<dyn TodoService>,
    health: HealthService,
    metrics: MetricsCollector,
) -> Router {
    let state = AppState {
        service,
        health,
        metrics: metrics.clone(),
    };

    Router::new()
        .route("/todo/", post(post_todo))
        .route(
            "/todo/{id}",
            get(get_todo).put(put_todo).delete(delete_todo),
        )
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_snapshot))
        .fallback(bad_routing)
        .method_not_allowed_fallback(bad_routing)
        .layer(middleware::from_fn_with_state(metrics, track_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = %self.code(), error = %self, "request failed");
        } else {
            debug!(code = %self.code(), error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// 按 JSON 解码请求体，不要求 `Content-Type`
fn decode_todo(body: Result<Bytes, BytesRejection>) -> Result<Todo, TodoError> {
    let body = body.map_err(|e| ServiceError::MalformedRequest(e.body_text()))?;
    let todo: Todo = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::MalformedRequest(e.to_string()))?;
    // 空 id 的记录无法再通过 /todo/{id} 访问
    if todo.id.is_empty() {
        return Err(ServiceError::MalformedRequest("missing id".to_string()).into());
    }
    Ok(todo)
}

async fn bad_routing() -> TodoError {
    ServiceError::BadRouting.into()
}

fn todo_id(path: Result<Path<String>, PathRejection>) -> Result<String, TodoError> {
    path.map(|Path(id)| id)
        .map_err(|_| ServiceError::BadRouting.into())
}

async fn post_todo(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, TodoError> {
    let todo = decode_todo(body)?;
    state.service.post_todo(todo).await?;
    Ok(Json(json!({})))
}

async fn get_todo(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Todo>, TodoError> {
    let id = todo_id(path)?;
    let todo = state.service.get_todo(&id).await?;
    Ok(Json(todo))
}

async fn put_todo(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, TodoError> {
    let id = todo_id(path)?;
    let todo = decode_todo(body)?;
    state.service.put_todo(&id, todo).await?;
    Ok(Json(json!({})))
}

async fn delete_todo(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>, TodoError> {
    let id = todo_id(path)?;
    state.service.delete_todo(&id).await?;
    Ok(Json(json!({})))
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let status = state.health.get_status().await;
    let code = if status == HealthStatus::Serving {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(json!({ "status": status })))
}

async fn metrics_snapshot(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.metrics.snapshot().await;
    Json(json!(snapshot))
}
