use std::sync::Arc;

use tracing::error;

use article_releases_core::{
    ApiType, HeaderReader, Message, MessageQueueConfig, OutputSdc, ReleaseError, ReleaseResult,
    Sdc, SessionRequester,
};

use crate::pipeline::AccepterPipeline;
use crate::releaser::HeaderReleaser;

/// 按API类型选择处理策略的入口
pub struct DpfmApiCaller {
    releases: AccepterPipeline,
}

impl DpfmApiCaller {
    pub fn new(releases: AccepterPipeline) -> Self {
        Self { releases }
    }

    /// 以已实现的全部 accepter 组装调用器
    pub fn from_config(
        requester: Arc<dyn SessionRequester>,
        reader: Arc<dyn HeaderReader>,
        config: &MessageQueueConfig,
    ) -> ReleaseResult<Self> {
        let header = HeaderReleaser::from_config(requester, reader, config)?;
        Ok(Self::new(
            AccepterPipeline::new().with_handler(Arc::new(header)),
        ))
    }

    /// 分发一次调用
    ///
    /// 同步失败通过 `output` 的状态字段报告，返回的错误列表始终为空。API类型未知时
    /// 记录日志并返回 `None`。
    pub async fn async_releases(
        &self,
        accepter: &[String],
        input: &Sdc,
        output: &mut OutputSdc,
    ) -> (Option<Message>, Vec<ReleaseError>) {
        let response = match input.api_type() {
            Ok(ApiType::Releases) => {
                Some(self.releases.release_all(input, output, accepter).await)
            }
            Err(e) => {
                error!(session_id = %input.session(), "unknown api type: {e}");
                None
            }
        };
        (response, Vec::new())
    }
}
