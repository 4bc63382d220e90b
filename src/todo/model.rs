use serde::{Deserialize, Serialize};

/// Todo 记录，以 `id` 为标识
///
/// 线上 JSON 字段为 `id`、`todo`、`completed`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,

    #[serde(rename = "todo")]
    pub text: String,

    #[serde(default)]
    pub completed: bool,
}

impl Todo {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            completed: false,
        }
    }

    /// 设置完成状态
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}
