use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;

use crate::metrics::MetricsCollector;

/// 记录每个请求的结果和耗时（5xx 记为失败）
pub async fn track_metrics(
    State(collector): State<MetricsCollector>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    let success = !response.status().is_server_error();
    collector.record_request(success, start.elapsed()).await;
    response
}
