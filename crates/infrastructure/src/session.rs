use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use article_releases_core::{ReleaseError, ReleaseResult, RuntimeSession, SessionResponse};
use tokio::sync::oneshot;
use tracing::debug;

struct Waiter {
    id: u64,
    sender: oneshot::Sender<SessionResponse>,
}

/// 等待响应的会话登记表
///
/// 每个会话同一时刻只允许一个未完成的请求，响应按 `runtime_session_id` 投递给
/// 对应的等待者。
#[derive(Clone, Default)]
pub struct PendingSessions {
    waiters: Arc<Mutex<HashMap<RuntimeSession, Waiter>>>,
    next_id: Arc<AtomicU64>,
}

impl PendingSessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RuntimeSession, Waiter>> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 登记会话，返回等待响应的句柄
    pub fn register(&self, session: &RuntimeSession) -> ReleaseResult<PendingReply> {
        let mut waiters = self.lock();
        if waiters.contains_key(session) {
            return Err(ReleaseError::SessionInUse {
                session_id: session.to_string(),
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        waiters.insert(session.clone(), Waiter { id, sender });
        debug!(session_id = %session, "会话已登记");

        Ok(PendingReply {
            id,
            session: session.clone(),
            receiver,
            sessions: self.clone(),
        })
    }

    /// 把响应交给等待中的会话，没有等待者时原样返回响应
    ///
    /// 交付后等待方仍可能被取消，响应随之丢弃，所以 broker 确认需在交付前完成。
    pub fn complete(&self, response: SessionResponse) -> Result<(), SessionResponse> {
        let waiter = self.lock().remove(&response.session);
        match waiter {
            Some(waiter) => waiter.sender.send(response),
            None => Err(response),
        }
    }

    /// 让所有等待中的会话以失败结束，返回受影响的会话数
    pub fn fail_all(&self) -> usize {
        let mut waiters = self.lock();
        let count = waiters.len();
        waiters.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn remove_if(&self, session: &RuntimeSession, id: u64) {
        let mut waiters = self.lock();
        if waiters.get(session).is_some_and(|waiter| waiter.id == id) {
            waiters.remove(session);
        }
    }
}

/// 单个会话请求的响应句柄
///
/// 句柄被丢弃时撤销登记，以免取消的请求占用会话。
pub struct PendingReply {
    id: u64,
    session: RuntimeSession,
    receiver: oneshot::Receiver<SessionResponse>,
    sessions: PendingSessions,
}

impl PendingReply {
    pub fn session(&self) -> &RuntimeSession {
        &self.session
    }

    /// 等待响应，会话被关闭时返回 `SessionClosed`
    pub async fn wait(mut self) -> ReleaseResult<SessionResponse> {
        (&mut self.receiver)
            .await
            .map_err(|_| ReleaseError::SessionClosed {
                session_id: self.session.to_string(),
            })
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.sessions.remove_if(&self.session, self.id);
    }
}
