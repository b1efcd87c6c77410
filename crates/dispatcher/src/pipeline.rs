use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use article_releases_core::{Accepter, Header, Message, OutputSdc, RuntimeSession, Sdc};

use crate::assembler;

/// 某个 accepter 发布成功的实体
#[derive(Debug, Clone, PartialEq)]
pub enum Released {
    Header(Header),
}

/// 已处理 accepter 的发布结果
///
/// 同一种 accepter 出现多次时保留最后一次的结果。
#[derive(Debug, Clone, Default)]
pub struct ReleaseOutcomes {
    attempted: Vec<Accepter>,
    header: Option<Header>,
}

impl ReleaseOutcomes {
    pub fn record(&mut self, accepter: Accepter, released: Option<Released>) {
        self.attempted.push(accepter);
        match accepter {
            Accepter::Header => {
                self.header = released.map(|Released::Header(header)| header);
            }
        }
    }

    pub fn attempted(&self) -> &[Accepter] {
        &self.attempted
    }

    pub fn was_attempted(&self, accepter: Accepter) -> bool {
        self.attempted.contains(&accepter)
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// Header 已成功提交且本次请求撤销了发布
    ///
    /// 依赖 Header 的 accepter 通过它决定是否跳过自身的发布。
    pub fn header_revoked(&self) -> bool {
        self.header
            .as_ref()
            .is_some_and(|header| header.is_released == Some(false))
    }

    pub fn into_message(self) -> Message {
        assembler::build(self.header)
    }
}

/// 单个 accepter 的发布处理器
#[async_trait]
pub trait AccepterHandler: Send + Sync {
    fn accepter(&self) -> Accepter;

    /// 执行发布，失败时返回 `None`
    ///
    /// `prior` 是本次调用中先于它处理的 accepter 的结果。依赖 Header 的处理器在这里
    /// 通过 [`ReleaseOutcomes::header_revoked`] 决定撤销发布时是否级联到自身。
    async fn release(
        &self,
        input: &Sdc,
        session: RuntimeSession,
        output: &mut OutputSdc,
        prior: &ReleaseOutcomes,
    ) -> Option<Released>;
}

/// 按请求顺序依次执行 accepter 处理器
///
/// 每个 accepter 只尝试一次，失败不会中断后续 accepter。
#[derive(Default)]
pub struct AccepterPipeline {
    handlers: HashMap<Accepter, Arc<dyn AccepterHandler>>,
}

impl AccepterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handler(mut self, handler: Arc<dyn AccepterHandler>) -> Self {
        self.handlers.insert(handler.accepter(), handler);
        self
    }

    pub fn handles(&self, accepter: Accepter) -> bool {
        self.handlers.contains_key(&accepter)
    }

    pub async fn release_all(
        &self,
        input: &Sdc,
        output: &mut OutputSdc,
        accepters: &[String],
    ) -> Message {
        let session = input.session();
        let mut outcomes = ReleaseOutcomes::default();

        for tag in accepters {
            let accepter = match tag.parse::<Accepter>() {
                Ok(accepter) => accepter,
                Err(e) => {
                    warn!(session_id = %session, accepter = %tag, "跳过accepter: {e}");
                    continue;
                }
            };

            let Some(handler) = self.handlers.get(&accepter) else {
                warn!(session_id = %session, %accepter, "没有注册accepter处理器，跳过");
                continue;
            };

            let released = handler
                .release(input, session.clone(), output, &outcomes)
                .await;
            if released.is_none() {
                debug!(session_id = %session, %accepter, "accepter发布失败，继续处理后续accepter");
            }
            outcomes.record(accepter, released);
        }

        outcomes.into_message()
    }
}
