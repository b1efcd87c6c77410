#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use article_releases_core::{
    Article, Header, HeaderReader, OutputSdc, ReleaseError, ReleaseResult, RemoteReply,
    RemoteRequest, Sdc, SessionRequester, SessionResponse,
};
use serde_json::Value;

pub const TEST_SESSION_ID: &str = "session-001";
pub const TEST_SQL_QUEUE: &str = "test-article-sql-queue";
pub const TEST_ARTICLE: i32 = 10001;

enum ReplyBehavior {
    Reply(Value),
    TransportError,
}

/// 记录请求并按预设方式响应的会话客户端
pub struct MockSessionRequester {
    behavior: ReplyBehavior,
    sent: Mutex<Vec<(String, RemoteRequest)>>,
    acked: Mutex<Vec<u64>>,
    next_tag: AtomicU64,
}

impl MockSessionRequester {
    pub fn replying(payload: Value) -> Self {
        Self::with_behavior(ReplyBehavior::Reply(payload))
    }

    pub fn failing() -> Self {
        Self::with_behavior(ReplyBehavior::TransportError)
    }

    fn with_behavior(behavior: ReplyBehavior) -> Self {
        Self {
            behavior,
            sent: Mutex::new(Vec::new()),
            acked: Mutex::new(Vec::new()),
            next_tag: AtomicU64::new(1),
        }
    }

    pub fn sent_requests(&self) -> Vec<(String, RemoteRequest)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn acked_tags(&self) -> Vec<u64> {
        self.acked.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionRequester for MockSessionRequester {
    async fn session_keep_request(
        &self,
        queue: &str,
        request: &RemoteRequest,
    ) -> ReleaseResult<SessionResponse> {
        self.sent
            .lock()
            .unwrap()
            .push((queue.to_string(), request.clone()));

        match &self.behavior {
            ReplyBehavior::Reply(payload) => {
                let reply: RemoteReply = serde_json::from_value(payload.clone())?;
                Ok(SessionResponse {
                    session: request.session().clone(),
                    delivery_tag: self.next_tag.fetch_add(1, Ordering::SeqCst),
                    reply,
                })
            }
            ReplyBehavior::TransportError => Err(ReleaseError::Session {
                session_id: request.session().to_string(),
                message: "channel closed".to_string(),
            }),
        }
    }

    async fn ack(&self, response: &SessionResponse) -> ReleaseResult<()> {
        self.acked.lock().unwrap().push(response.delivery_tag);
        Ok(())
    }
}

enum ReadBehavior {
    Found(Header),
    Missing,
    Error,
}

/// 返回预设 Header 的读取器
pub struct MockHeaderReader {
    behavior: ReadBehavior,
    calls: AtomicUsize,
}

impl MockHeaderReader {
    pub fn found(header: Header) -> Self {
        Self::with_behavior(ReadBehavior::Found(header))
    }

    pub fn missing() -> Self {
        Self::with_behavior(ReadBehavior::Missing)
    }

    pub fn failing() -> Self {
        Self::with_behavior(ReadBehavior::Error)
    }

    fn with_behavior(behavior: ReadBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HeaderReader for MockHeaderReader {
    async fn read_header(&self, _request: &Sdc) -> ReleaseResult<Option<Header>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            ReadBehavior::Found(header) => Ok(Some(header.clone())),
            ReadBehavior::Missing => Ok(None),
            ReadBehavior::Error => Err(ReleaseError::Internal("connection reset".to_string())),
        }
    }
}

pub fn create_test_header() -> Header {
    Header {
        article: TEST_ARTICLE,
        article_type: "NEWS".to_string(),
        article_owner: 201,
        article_owner_business_partner_role: "OWNER".to_string(),
        description: "test article".to_string(),
        is_released: None,
        is_marked_for_deletion: Some(false),
        ..Default::default()
    }
}

pub fn create_test_request(api_type: &str, is_released: Option<bool>) -> Sdc {
    Sdc {
        runtime_session_id: TEST_SESSION_ID.to_string(),
        api_type: api_type.to_string(),
        article: Article {
            article: TEST_ARTICLE,
            is_released,
        },
        accepter: vec!["Header".to_string()],
        ..Default::default()
    }
}

pub fn create_test_output(request: &Sdc) -> OutputSdc {
    OutputSdc::from_request(request)
}

pub fn accepters(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|tag| tag.to_string()).collect()
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
