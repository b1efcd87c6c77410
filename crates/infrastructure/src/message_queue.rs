use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use lapin::{
    options::*, types::FieldTable, BasicProperties, Channel, Connection, ConnectionProperties,
    Consumer, Queue,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use article_releases_core::{
    MessageQueueConfig, ReleaseError, ReleaseResult, RemoteReply, RemoteRequest, RuntimeSession,
    SessionRequester, SessionResponse,
};

use crate::session::PendingSessions;

/// RabbitMQ会话客户端
///
/// 会话请求发布到SQL处理队列，`reply_to` 指向本服务的响应队列，`correlation_id`
/// 取运行时会话标识。后台监听任务按会话标识把响应交给等待中的请求。
///
/// 响应在监听任务收到时立即确认，等待方是否还在都不影响响应队列的预取窗口。
pub struct RabbitMQSessionClient {
    connection: Connection,
    channel: Arc<Mutex<Channel>>,
    pending: PendingSessions,
    config: MessageQueueConfig,
}

impl RabbitMQSessionClient {
    /// 连接RabbitMQ并启动响应监听
    pub async fn connect(config: MessageQueueConfig) -> ReleaseResult<Self> {
        let connection = tokio::time::timeout(
            Duration::from_secs(config.connection_timeout_seconds),
            Connection::connect(&config.url, ConnectionProperties::default()),
        )
        .await
        .map_err(|_| ReleaseError::MessageQueue(format!("连接RabbitMQ超时: {}", config.url)))?
        .map_err(|e| ReleaseError::MessageQueue(format!("连接RabbitMQ失败: {e}")))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| ReleaseError::MessageQueue(format!("创建通道失败: {e}")))?;

        channel
            .basic_qos(config.prefetch_count, BasicQosOptions::default())
            .await
            .map_err(|e| ReleaseError::MessageQueue(format!("设置预取数量失败: {e}")))?;

        info!("成功连接到RabbitMQ: {}", config.url);

        let client = Self {
            connection,
            channel: Arc::new(Mutex::new(channel)),
            pending: PendingSessions::new(),
            config,
        };

        client.initialize_queues().await?;
        client.start_reply_listener().await?;

        Ok(client)
    }

    /// 初始化所有必需的队列
    async fn initialize_queues(&self) -> ReleaseResult<()> {
        let channel = self.channel.lock().await;

        Self::declare_queue(&channel, &self.config.queue_from).await?;
        Self::declare_queue(&channel, &self.config.session_reply_queue).await?;
        for queue in self
            .config
            .queue_to_sql
            .iter()
            .chain(self.config.queue_to_response.iter())
        {
            Self::declare_queue(&channel, queue).await?;
        }

        info!("所有队列初始化完成");
        Ok(())
    }

    /// 声明队列
    async fn declare_queue(channel: &Channel, queue_name: &str) -> ReleaseResult<Queue> {
        let queue = channel
            .queue_declare(
                queue_name,
                QueueDeclareOptions {
                    durable: true,
                    exclusive: false,
                    auto_delete: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| ReleaseError::MessageQueue(format!("声明队列 {queue_name} 失败: {e}")))?;

        debug!("队列 {} 声明成功", queue_name);
        Ok(queue)
    }

    /// 启动响应监听任务
    async fn start_reply_listener(&self) -> ReleaseResult<()> {
        let consumer_tag = format!("article-releases-reply-{}", Uuid::new_v4());
        let mut consumer = self
            .create_consumer(&self.config.session_reply_queue, &consumer_tag)
            .await?;

        let pending = self.pending.clone();
        let channel = self.channel.clone();
        let reply_queue = self.config.session_reply_queue.clone();

        tokio::spawn(async move {
            while let Some(delivery) = consumer.next().await {
                match delivery {
                    Ok(delivery) => {
                        let correlation_id = delivery
                            .properties
                            .correlation_id()
                            .as_ref()
                            .map(|id| id.as_str().to_string());
                        route_reply(
                            &pending,
                            &channel,
                            delivery.delivery_tag,
                            correlation_id,
                            &delivery.data,
                        )
                        .await;
                    }
                    Err(e) => {
                        error!(queue = %reply_queue, "响应队列消费失败: {e}");
                        break;
                    }
                }
            }

            let closed = pending.fail_all();
            warn!(queue = %reply_queue, "响应监听已停止，{} 个等待中的会话被关闭", closed);
        });

        Ok(())
    }

    /// 创建消费者
    pub async fn create_consumer(&self, queue: &str, consumer_tag: &str) -> ReleaseResult<Consumer> {
        let channel = self.channel.lock().await;
        let consumer = channel
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| ReleaseError::MessageQueue(format!("创建消费者失败: {e}")))?;

        debug!("为队列 {} 创建消费者: {}", queue, consumer_tag);
        Ok(consumer)
    }

    /// 发布JSON消息到指定队列
    pub async fn publish_json<T: Serialize + Sync>(
        &self,
        queue: &str,
        message: &T,
    ) -> ReleaseResult<()> {
        let payload = serde_json::to_vec(message)?;
        self.publish(queue, &payload, Self::json_properties()).await
    }

    async fn publish(
        &self,
        queue: &str,
        payload: &[u8],
        properties: BasicProperties,
    ) -> ReleaseResult<()> {
        let channel = self.channel.lock().await;
        let confirm = channel
            .basic_publish("", queue, BasicPublishOptions::default(), payload, properties)
            .await
            .map_err(|e| ReleaseError::MessageQueue(format!("发布消息到队列 {queue} 失败: {e}")))?;

        confirm
            .await
            .map_err(|e| ReleaseError::MessageQueue(format!("消息发布确认失败: {e}")))?;

        debug!("消息已发布到队列: {}", queue);
        Ok(())
    }

    fn json_properties() -> BasicProperties {
        BasicProperties::default()
            .with_content_type("application/json".into())
            .with_delivery_mode(2)
    }

    /// 确认消息处理完成
    pub async fn ack_delivery(&self, delivery_tag: u64) -> ReleaseResult<()> {
        let channel = self.channel.lock().await;
        channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await
            .map_err(|e| ReleaseError::MessageQueue(format!("确认消息失败: {e}")))
    }

    /// 拒绝消息，不重新入队
    pub async fn reject_delivery(&self, delivery_tag: u64) -> ReleaseResult<()> {
        let channel = self.channel.lock().await;
        channel
            .basic_reject(delivery_tag, BasicRejectOptions { requeue: false })
            .await
            .map_err(|e| ReleaseError::MessageQueue(format!("拒绝消息失败: {e}")))
    }

    pub fn config(&self) -> &MessageQueueConfig {
        &self.config
    }

    /// 获取连接状态
    pub fn is_connected(&self) -> bool {
        self.connection.status().connected()
    }

    /// 等待中的会话数
    pub fn pending_sessions(&self) -> usize {
        self.pending.len()
    }

    /// 关闭连接，所有等待中的会话以失败结束
    pub async fn close(&self) -> ReleaseResult<()> {
        let closed = self.pending.fail_all();
        if closed > 0 {
            warn!("关闭连接时仍有 {} 个等待中的会话", closed);
        }

        self.connection
            .close(200, "正常关闭")
            .await
            .map_err(|e| ReleaseError::MessageQueue(format!("关闭连接失败: {e}")))?;

        info!("RabbitMQ连接已关闭");
        Ok(())
    }
}

#[async_trait]
impl SessionRequester for RabbitMQSessionClient {
    async fn session_keep_request(
        &self,
        queue: &str,
        request: &RemoteRequest,
    ) -> ReleaseResult<SessionResponse> {
        let session = request.session();
        let pending = self.pending.register(session)?;

        let properties = Self::json_properties()
            .with_correlation_id(session.as_str().into())
            .with_reply_to(self.config.session_reply_queue.as_str().into());
        self.publish(queue, &request.to_bytes()?, properties)
            .await
            .map_err(|e| ReleaseError::Session {
                session_id: session.to_string(),
                message: e.to_string(),
            })?;

        debug!(session_id = %session, queue, "会话请求已发送，等待响应");
        match self.config.session_timeout_seconds {
            0 => pending.wait().await,
            seconds => tokio::time::timeout(Duration::from_secs(seconds), pending.wait())
                .await
                .map_err(|_| ReleaseError::Session {
                    session_id: session.to_string(),
                    message: format!("{seconds} 秒内未收到响应"),
                })?,
        }
    }

    async fn ack(&self, response: &SessionResponse) -> ReleaseResult<()> {
        // broker 投递已由响应监听确认
        debug!(
            session_id = %response.session,
            delivery_tag = response.delivery_tag,
            "会话响应处理完成"
        );
        Ok(())
    }
}

/// 响应投递的确认方
#[async_trait]
pub(crate) trait ReplyAcker: Send + Sync {
    async fn ack_reply(&self, delivery_tag: u64);
}

#[async_trait]
impl ReplyAcker for Arc<Mutex<Channel>> {
    async fn ack_reply(&self, delivery_tag: u64) {
        let channel = self.lock().await;
        if let Err(e) = channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await
        {
            warn!(delivery_tag, "确认响应失败: {e}");
        }
    }
}

/// 确认一条响应并交给对应的会话，返回是否有等待者接收
///
/// 先确认再投递：等待方之后被取消或超时，响应也不会占住预取窗口。
pub(crate) async fn route_reply<A: ReplyAcker + ?Sized>(
    pending: &PendingSessions,
    acker: &A,
    delivery_tag: u64,
    correlation_id: Option<String>,
    data: &[u8],
) -> bool {
    acker.ack_reply(delivery_tag).await;

    let reply = RemoteReply::from_slice(data).unwrap_or_else(|e| {
        warn!("响应解码失败，按失败结果处理: {e}");
        RemoteReply::default()
    });

    let Some(session_id) = correlation_id.or_else(|| reply.runtime_session_id.clone()) else {
        warn!(delivery_tag, "响应缺少会话标识，丢弃");
        return false;
    };

    let response = SessionResponse {
        session: RuntimeSession::new(session_id),
        delivery_tag,
        reply,
    };

    match pending.complete(response) {
        Ok(()) => true,
        Err(unmatched) => {
            warn!(session_id = %unmatched.session, "没有等待该会话的请求，丢弃响应");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingAcker {
        acked: StdMutex<Vec<u64>>,
    }

    impl RecordingAcker {
        fn acked(&self) -> Vec<u64> {
            self.acked.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReplyAcker for RecordingAcker {
        async fn ack_reply(&self, delivery_tag: u64) {
            self.acked.lock().unwrap().push(delivery_tag);
        }
    }

    const SUCCESS: &[u8] = br#"{"result":"success"}"#;

    #[tokio::test]
    async fn test_reply_routed_by_correlation_id_and_acked() {
        let pending = PendingSessions::new();
        let acker = RecordingAcker::default();
        let waiter = pending.register(&RuntimeSession::new("session-a")).unwrap();

        let routed = route_reply(&pending, &acker, 3, Some("session-a".to_string()), SUCCESS).await;

        assert!(routed);
        assert_eq!(acker.acked(), vec![3]);
        let response = waiter.wait().await.unwrap();
        assert_eq!(response.delivery_tag, 3);
        assert!(response.reply.is_success());
    }

    #[tokio::test]
    async fn test_reply_falls_back_to_body_session_id() {
        let pending = PendingSessions::new();
        let acker = RecordingAcker::default();
        let waiter = pending.register(&RuntimeSession::new("session-b")).unwrap();

        let body = br#"{"result":"failed","runtime_session_id":"session-b"}"#;
        assert!(route_reply(&pending, &acker, 4, None, body).await);

        assert!(!waiter.wait().await.unwrap().reply.is_success());
    }

    #[tokio::test]
    async fn test_reply_for_dropped_waiter_is_still_acked() {
        let pending = PendingSessions::new();
        let acker = RecordingAcker::default();

        // 响应交付后等待方被取消，响应随之丢弃
        let waiter = pending.register(&RuntimeSession::new("session-a")).unwrap();
        assert!(route_reply(&pending, &acker, 42, Some("session-a".to_string()), SUCCESS).await);
        drop(waiter);

        // 等待方先被取消，响应到达时已无人接收
        let waiter = pending.register(&RuntimeSession::new("session-b")).unwrap();
        drop(waiter);
        assert!(!route_reply(&pending, &acker, 43, Some("session-b".to_string()), SUCCESS).await);

        assert_eq!(acker.acked(), vec![42, 43]);
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_unheld_reply_does_not_block_other_sessions() {
        let pending = PendingSessions::new();
        let acker = RecordingAcker::default();
        let first = pending.register(&RuntimeSession::new("session-a")).unwrap();
        let second = pending.register(&RuntimeSession::new("session-b")).unwrap();

        route_reply(&pending, &acker, 1, Some("session-a".to_string()), SUCCESS).await;
        route_reply(&pending, &acker, 2, Some("session-b".to_string()), SUCCESS).await;

        // 第一个会话尚未取走响应，两条投递都已确认
        assert_eq!(acker.acked(), vec![1, 2]);
        assert_eq!(second.wait().await.unwrap().delivery_tag, 2);
        assert_eq!(first.wait().await.unwrap().delivery_tag, 1);
    }

    #[tokio::test]
    async fn test_undecodable_or_anonymous_reply_is_acked_and_dropped() {
        let pending = PendingSessions::new();
        let acker = RecordingAcker::default();

        assert!(!route_reply(&pending, &acker, 7, None, b"not json").await);
        assert!(!route_reply(&pending, &acker, 8, None, SUCCESS).await);
        assert_eq!(acker.acked(), vec![7, 8]);
    }
}
