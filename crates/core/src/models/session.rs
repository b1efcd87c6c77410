use std::fmt;

use serde::{Deserialize, Serialize};

/// 运行时会话句柄
///
/// 一次调用的所有远程请求都通过同一个会话标识关联响应。句柄按值沿调用链传递，
/// 不依赖任何全局状态，因此并发的调用即使共享同一个 broker 连接也不会串扰。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeSession(String);

impl RuntimeSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuntimeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuntimeSession {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RuntimeSession {
    fn from(id: String) -> Self {
        Self(id)
    }
}
