use async_trait::async_trait;

use crate::{
    models::{RemoteRequest, SessionResponse},
    ReleaseResult,
};

/// 会话级请求/响应抽象接口
///
/// 在异步的消息队列之上提供同步的点对点请求：调用方等待携带相同
/// `runtime_session_id` 的响应，或会话/broker 报告失败。超时与取消由实现方负责。
#[async_trait]
pub trait SessionRequester: Send + Sync {
    /// 向指定队列发送会话请求并等待对应的响应
    async fn session_keep_request(
        &self,
        queue: &str,
        request: &RemoteRequest,
    ) -> ReleaseResult<SessionResponse>;

    /// 确认响应已处理
    ///
    /// broker 投递在实现方接收响应时可能已经确认，这时只需记录处理完成。
    async fn ack(&self, response: &SessionResponse) -> ReleaseResult<()>;
}
