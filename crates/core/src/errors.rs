use thiserror::Error;

/// 发布服务错误类型定义
#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("消息队列错误: {0}")]
    MessageQueue(String),

    #[error("会话 {session_id} 请求失败: {message}")]
    Session { session_id: String, message: String },

    #[error("会话 {session_id} 在收到响应前已关闭")]
    SessionClosed { session_id: String },

    #[error("会话 {session_id} 已有未完成的请求")]
    SessionInUse { session_id: String },

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("未知的API类型: {0}")]
    UnknownApiType(String),

    #[error("未知的Accepter: {0}")]
    UnknownAccepter(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for ReleaseError {
    fn from(e: serde_json::Error) -> Self {
        ReleaseError::Serialization(e.to_string())
    }
}

/// 统一的Result类型
pub type ReleaseResult<T> = std::result::Result<T, ReleaseError>;
