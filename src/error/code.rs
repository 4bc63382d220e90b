//! 错误代码和错误类别定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 错误代码枚举
///
/// 错误代码按类别分组，每个类别占用1000个代码范围：
/// - 1000-1999: 业务（领域）错误，随响应体返回，不重试
/// - 2000-2999: 连接相关错误
/// - 3000-3999: 客户端调用错误
/// - 4000-4999: 服务发现相关错误
/// - 9000-9999: 系统错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum ErrorCode {
    // ============================================================
    // 业务错误 (1000-1999)
    // ============================================================
    NotFound = 1000,
    AlreadyExists = 1001,
    InconsistentId = 1002,
    BadRouting = 1003,
    MalformedRequest = 1004,
    ServiceFailure = 1005,

    // ============================================================
    // 连接相关错误 (2000-2999)
    // ============================================================
    ConnectionFailed = 2000,
    ConnectionRefused = 2001,
    ConnectionTimeout = 2002,
    ServiceUnavailable = 2003,
    NoEndpoints = 2004,

    // ============================================================
    // 客户端调用错误 (3000-3999)
    // ============================================================
    RetryExhausted = 3000,
    DecodeFailed = 3001,
    InvalidLocation = 3002,

    // ============================================================
    // 服务发现错误 (4000-4999)
    // ============================================================
    DiscoveryUnavailable = 4000,

    // ============================================================
    // 系统错误 (9000-9999)
    // ============================================================
    ConfigurationError = 9000,
    IoError = 9001,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ErrorCode {
    /// 获取错误代码的数字值
    #[inline]
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    /// 获取错误代码的英文标识符
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::InconsistentId => "INCONSISTENT_ID",
            ErrorCode::BadRouting => "BAD_ROUTING",
            ErrorCode::MalformedRequest => "MALFORMED_REQUEST",
            ErrorCode::ServiceFailure => "SERVICE_FAILURE",
            ErrorCode::ConnectionFailed => "CONNECTION_FAILED",
            ErrorCode::ConnectionRefused => "CONNECTION_REFUSED",
            ErrorCode::ConnectionTimeout => "CONNECTION_TIMEOUT",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::NoEndpoints => "NO_ENDPOINTS",
            ErrorCode::RetryExhausted => "RETRY_EXHAUSTED",
            ErrorCode::DecodeFailed => "DECODE_FAILED",
            ErrorCode::InvalidLocation => "INVALID_LOCATION",
            ErrorCode::DiscoveryUnavailable => "DISCOVERY_UNAVAILABLE",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorCode::IoError => "IO_ERROR",
        }
    }

    /// 获取错误代码的类别
    pub fn category(&self) -> ErrorCategory {
        match self.as_u32() {
            1000..=1999 => ErrorCategory::Domain,
            2000..=2999 => ErrorCategory::Connection,
            3000..=3999 => ErrorCategory::Client,
            4000..=4999 => ErrorCategory::Discovery,
            _ => ErrorCategory::System,
        }
    }

    /// 判断是否为可重试的错误
    ///
    /// 只有传输层错误可以换一个实例重试；业务错误原样返回。
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::ConnectionFailed
                | ErrorCode::ConnectionRefused
                | ErrorCode::ConnectionTimeout
                | ErrorCode::ServiceUnavailable
                | ErrorCode::NoEndpoints
        )
    }
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Domain,
    Connection,
    Client,
    Discovery,
    System,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Domain => write!(f, "DOMAIN"),
            ErrorCategory::Connection => write!(f, "CONNECTION"),
            ErrorCategory::Client => write!(f, "CLIENT"),
            ErrorCategory::Discovery => write!(f, "DISCOVERY"),
            ErrorCategory::System => write!(f, "SYSTEM"),
        }
    }
}
