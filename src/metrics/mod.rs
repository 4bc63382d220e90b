//! 指标收集模块

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// 只保留最近这么多个请求的耗时
const RECENT_DURATIONS: usize = 1000;

/// 指标数据
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    pub requests_total: u64,
    pub requests_success: u64,
    pub requests_failed: u64,
    pub request_duration_ms: VecDeque<u64>,
}

/// `GET /metrics` 返回的快照
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub requests_success: u64,
    pub requests_failed: u64,
    pub recent_samples: usize,
    pub avg_duration_ms: f64,
    pub max_duration_ms: u64,
}

impl Metrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        let samples = self.request_duration_ms.len();
        let sum: u64 = self.request_duration_ms.iter().sum();
        MetricsSnapshot {
            requests_total: self.requests_total,
            requests_success: self.requests_success,
            requests_failed: self.requests_failed,
            recent_samples: samples,
            avg_duration_ms: if samples == 0 {
                0.0
            } else {
                sum as f64 / samples as f64
            },
            max_duration_ms: self.request_duration_ms.iter().copied().max().unwrap_or(0),
        }
    }
}

/// 指标收集器
#[derive(Clone)]
pub struct MetricsCollector {
    metrics: Arc<RwLock<Metrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(Metrics::default())),
        }
    }

    pub async fn record_request(&self, success: bool, duration: Duration) {
        let mut metrics = self.metrics.write().await;
        metrics.requests_total += 1;

        if success {
            metrics.requests_success += 1;
        } else {
            metrics.requests_failed += 1;
        }

        if metrics.request_duration_ms.len() == RECENT_DURATIONS {
            metrics.request_duration_ms.pop_front();
        }
        metrics
            .request_duration_ms
            .push_back(duration.as_millis() as u64);
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        self.metrics.read().await.snapshot()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
