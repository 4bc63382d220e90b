//! 错误处理模块
//!
//! 区分两类失败：
//! - 业务错误（[`ServiceError`]）：随成功的传输响应一起返回，不重试
//! - 基础设施错误（[`TodoError`] 其他变体）：连接失败、超时、服务发现失败等

pub mod code;
pub mod conversions;

pub use code::{ErrorCategory, ErrorCode};

use http::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// 业务错误（领域哨兵值）
///
/// `Display` 的文本同时也是线上 `{"error": "..."}` 的内容，客户端据此还原。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("inconsistent id")]
    InconsistentId,

    #[error("already exists")]
    AlreadyExists,

    #[error("not found")]
    NotFound,

    #[error("inconsistent mapping between route and handler (programmer error)")]
    BadRouting,

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// 无法识别的远端错误
    #[error("{0}")]
    Unknown(String),
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::InconsistentId => ErrorCode::InconsistentId,
            ServiceError::AlreadyExists => ErrorCode::AlreadyExists,
            ServiceError::NotFound => ErrorCode::NotFound,
            ServiceError::BadRouting => ErrorCode::BadRouting,
            ServiceError::MalformedRequest(_) => ErrorCode::MalformedRequest,
            ServiceError::Unknown(_) => ErrorCode::ServiceFailure,
        }
    }

    /// HTTP 状态码映射：404 未找到，400 已存在/ID 不一致，其余 500
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::AlreadyExists | ServiceError::InconsistentId => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 从响应体中的错误文本还原哨兵值
    pub fn from_message(message: &str) -> Self {
        match message {
            "inconsistent id" => ServiceError::InconsistentId,
            "already exists" => ServiceError::AlreadyExists,
            "not found" => ServiceError::NotFound,
            other => {
                if let Some(reason) = other.strip_prefix("malformed request: ") {
                    ServiceError::MalformedRequest(reason.to_string())
                } else if other == ServiceError::BadRouting.to_string() {
                    ServiceError::BadRouting
                } else {
                    ServiceError::Unknown(other.to_string())
                }
            }
        }
    }
}

/// 统一错误类型
#[derive(Error, Debug, Clone)]
pub enum TodoError {
    /// 业务错误
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// 实例池为空（可重试，实例池可能重新填充）
    #[error("no endpoints available")]
    NoEndpoints,

    /// 传输层错误
    #[error("transport error [{code}] {reason}")]
    Transport { code: ErrorCode, reason: String },

    /// 响应解码失败
    #[error("decode error: {0}")]
    Decode(String),

    /// 服务发现错误
    #[error("discovery error: {0}")]
    Discovery(String),

    /// 重试预算耗尽，携带最后一次失败
    #[error("retry budget exhausted after {attempts} attempt(s) in {elapsed:?}: {last}")]
    RetryExhausted {
        attempts: usize,
        elapsed: Duration,
        last: Box<TodoError>,
    },

    /// 配置错误
    #[error("configuration error: {0}")]
    Config(String),

    /// IO 错误
    #[error("io error: {0}")]
    Io(String),
}

impl TodoError {
    /// 创建传输层错误
    pub fn transport(code: ErrorCode, reason: impl Into<String>) -> Self {
        TodoError::Transport {
            code,
            reason: reason.into(),
        }
    }

    /// 创建服务发现错误
    pub fn discovery(reason: impl Into<String>) -> Self {
        TodoError::Discovery(reason.into())
    }

    /// 创建配置错误
    pub fn config(reason: impl Into<String>) -> Self {
        TodoError::Config(reason.into())
    }

    /// 获取错误代码
    pub fn code(&self) -> ErrorCode {
        match self {
            TodoError::Service(e) => e.code(),
            TodoError::NoEndpoints => ErrorCode::NoEndpoints,
            TodoError::Transport { code, .. } => *code,
            TodoError::Decode(_) => ErrorCode::DecodeFailed,
            TodoError::Discovery(_) => ErrorCode::DiscoveryUnavailable,
            TodoError::RetryExhausted { .. } => ErrorCode::RetryExhausted,
            TodoError::Config(_) => ErrorCode::ConfigurationError,
            TodoError::Io(_) => ErrorCode::IoError,
        }
    }

    /// 判断是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        match self {
            TodoError::NoEndpoints | TodoError::Transport { .. } => self.code().is_retryable(),
            _ => false,
        }
    }

    /// 获取业务错误（如果有）
    pub fn as_service(&self) -> Option<&ServiceError> {
        match self {
            TodoError::Service(e) => Some(e),
            _ => None,
        }
    }

    /// HTTP 状态码映射
    pub fn status_code(&self) -> StatusCode {
        match self {
            TodoError::Service(e) => e.status_code(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, TodoError>;
