//! 错误类型转换实现

use super::{ErrorCode, TodoError};
use std::io;

impl From<io::Error> for TodoError {
    fn from(err: io::Error) -> Self {
        TodoError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TodoError {
    fn from(err: serde_json::Error) -> Self {
        TodoError::Decode(format!("JSON 解析错误: {}", err))
    }
}

impl From<toml::de::Error> for TodoError {
    fn from(err: toml::de::Error) -> Self {
        TodoError::Config(err.to_string())
    }
}

/// reqwest 错误按连接阶段归类，决定能否换实例重试
impl From<reqwest::Error> for TodoError {
    fn from(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ErrorCode::ConnectionTimeout
        } else if err.is_connect() {
            ErrorCode::ConnectionRefused
        } else if err.is_decode() {
            return TodoError::Decode(err.to_string());
        } else if err.is_builder() {
            ErrorCode::InvalidLocation
        } else {
            ErrorCode::ConnectionFailed
        };
        TodoError::transport(code, err.to_string())
    }
}
