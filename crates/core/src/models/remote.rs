use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::RuntimeSession;
use crate::errors::ReleaseResult;

/// SQL 处理 worker 返回成功时 `result` 字段的取值
pub const REPLY_SUCCESS: &str = "success";

/// 远程 worker 上执行的函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteFunction {
    ArticleHeader,
}

/// 发往 SQL 处理队列的会话请求信封
///
/// 序列化后恰好包含 `message`、`function`、`runtime_session_id` 三个顶层字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRequest {
    pub message: Value,
    pub function: RemoteFunction,
    pub runtime_session_id: RuntimeSession,
}

impl RemoteRequest {
    pub fn new<T: Serialize>(
        function: RemoteFunction,
        message: &T,
        session: RuntimeSession,
    ) -> ReleaseResult<Self> {
        Ok(Self {
            message: serde_json::to_value(message)?,
            function,
            runtime_session_id: session,
        })
    }

    pub fn session(&self) -> &RuntimeSession {
        &self.runtime_session_id
    }

    pub fn to_bytes(&self) -> ReleaseResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// SQL 处理 worker 的响应
///
/// 在传输边界一次性解码。`result` 缺失、为 `null` 或不是字符串时都解码为 `None`，
/// 其余字段只用于日志。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteReply {
    #[serde(default, deserialize_with = "string_or_none")]
    pub result: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub runtime_session_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl RemoteReply {
    pub fn from_slice(data: &[u8]) -> ReleaseResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// 仅当 `result` 严格等于 `"success"` 时成功
    pub fn is_success(&self) -> bool {
        self.result.as_deref() == Some(REPLY_SUCCESS)
    }
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// 会话请求收到的响应投递
#[derive(Debug, Clone)]
pub struct SessionResponse {
    pub session: RuntimeSession,
    /// broker 投递标签，确认响应时使用
    pub delivery_tag: u64,
    pub reply: RemoteReply,
}
