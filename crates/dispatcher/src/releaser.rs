use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use article_releases_core::{
    Accepter, Header, HeaderReader, MessageQueueConfig, OutputSdc, ReleaseResult, RemoteFunction,
    RemoteRequest, RuntimeSession, Sdc, SessionRequester,
};

use crate::classifier::check_result;
use crate::pipeline::{AccepterHandler, ReleaseOutcomes, Released};

/// SQL 处理 worker 拒绝 Header 发布时写入响应的错误信息
pub const HEADER_RELEASE_ERROR: &str = "Header Data cannot release";

/// Header 的远程发布调用
///
/// 读取当前 Header，按请求设置发布标志，再通过会话请求交给 SQL 处理 worker 提交。
/// 只有 worker 确认成功时才返回 Header。
pub struct HeaderReleaser {
    requester: Arc<dyn SessionRequester>,
    reader: Arc<dyn HeaderReader>,
    sql_queue: String,
}

impl HeaderReleaser {
    pub fn new(
        requester: Arc<dyn SessionRequester>,
        reader: Arc<dyn HeaderReader>,
        sql_queue: impl Into<String>,
    ) -> Self {
        Self {
            requester,
            reader,
            sql_queue: sql_queue.into(),
        }
    }

    /// 使用配置中的第一个SQL处理队列
    pub fn from_config(
        requester: Arc<dyn SessionRequester>,
        reader: Arc<dyn HeaderReader>,
        config: &MessageQueueConfig,
    ) -> ReleaseResult<Self> {
        Ok(Self::new(requester, reader, config.queue_to_sql()?))
    }

    pub fn sql_queue(&self) -> &str {
        &self.sql_queue
    }

    pub async fn release_header(
        &self,
        input: &Sdc,
        session: RuntimeSession,
        output: &mut OutputSdc,
    ) -> Option<Header> {
        let mut header = match self.reader.read_header(input).await {
            Ok(Some(header)) => header,
            Ok(None) => {
                debug!(
                    session_id = %session,
                    article = input.article.article,
                    "未找到Header数据，跳过发布"
                );
                return None;
            }
            Err(e) => {
                error!(
                    session_id = %session,
                    article = input.article.article,
                    "读取Header数据失败: {e}"
                );
                return None;
            }
        };

        header.is_released = input.article.is_released;

        let request = match RemoteRequest::new(RemoteFunction::ArticleHeader, &header, session) {
            Ok(request) => request,
            Err(e) => {
                error!("构建Header发布请求失败: {e}");
                return None;
            }
        };

        let response = match self
            .requester
            .session_keep_request(&self.sql_queue, &request)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(
                    session_id = %request.session(),
                    queue = %self.sql_queue,
                    "rmq error: {e}"
                );
                return None;
            }
        };

        if let Err(e) = self.requester.ack(&response).await {
            warn!(session_id = %response.session, "确认会话响应失败: {e}");
        }

        if !check_result(&response) {
            warn!(
                session_id = %response.session,
                result = ?response.reply.result,
                "SQL处理worker拒绝Header发布"
            );
            output.record_sql_update_failure(HEADER_RELEASE_ERROR);
            return None;
        }

        info!(
            session_id = %response.session,
            article = header.article,
            is_released = ?header.is_released,
            "Header发布成功"
        );
        Some(header)
    }
}

#[async_trait]
impl AccepterHandler for HeaderReleaser {
    fn accepter(&self) -> Accepter {
        Accepter::Header
    }

    async fn release(
        &self,
        input: &Sdc,
        session: RuntimeSession,
        output: &mut OutputSdc,
        _prior: &ReleaseOutcomes,
    ) -> Option<Released> {
        self.release_header(input, session, output)
            .await
            .map(Released::Header)
    }
}
