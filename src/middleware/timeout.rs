use std::time::Duration;
use tower::timeout::Timeout;
use tower::timeout::error::Elapsed;
use tower::util::MapErr;
use tower::{BoxError, Layer};

use crate::error::{ErrorCode, TodoError};

type ErrorMapper = fn(BoxError) -> TodoError;

/// 单次尝试的超时中间件层
///
/// 超时记为可重试的 `ConnectionTimeout`，内层的 [`TodoError`] 原样透出。
#[derive(Debug, Clone, Copy)]
pub struct TimeoutLayer {
    timeout: Duration,
}

impl TimeoutLayer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = MapErr<Timeout<S>, ErrorMapper>;

    fn layer(&self, service: S) -> Self::Service {
        MapErr::new(
            Timeout::new(service, self.timeout),
            into_todo_error as ErrorMapper,
        )
    }
}

/// 把 tower 的装箱错误还原成 [`TodoError`]
pub fn into_todo_error(err: BoxError) -> TodoError {
    match err.downcast::<TodoError>() {
        Ok(err) => *err,
        Err(err) if err.is::<Elapsed>() => {
            TodoError::transport(ErrorCode::ConnectionTimeout, "attempt timed out")
        }
        Err(err) => TodoError::transport(ErrorCode::ConnectionFailed, err.to_string()),
    }
}
