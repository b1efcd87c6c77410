use std::sync::Arc;

use anyhow::{Context, Result};
use article_releases_core::{AppConfig, OutputSdc, Sdc};
use article_releases_dispatcher::DpfmApiCaller;
use article_releases_infrastructure::{RabbitMQSessionClient, SqlHeaderReader};
use futures::StreamExt;
use lapin::message::Delivery;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 发布服务应用
///
/// 从请求队列逐条消费发布请求，分发后把响应发布到所有响应队列。
pub struct Application {
    config: AppConfig,
    client: Arc<RabbitMQSessionClient>,
    reader: Arc<SqlHeaderReader>,
    caller: DpfmApiCaller,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let client = Arc::new(
            RabbitMQSessionClient::connect(config.message_queue.clone())
                .await
                .context("连接RabbitMQ失败")?,
        );
        let reader = Arc::new(
            SqlHeaderReader::connect(&config.database)
                .await
                .context("连接数据库失败")?,
        );
        let caller = DpfmApiCaller::from_config(client.clone(), reader.clone(), &config.message_queue)
            .context("创建API调用器失败")?;

        Ok(Self {
            config,
            client,
            reader,
            caller,
        })
    }

    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let queue = &self.config.message_queue.queue_from;
        let consumer_tag = format!("article-releases-{}", Uuid::new_v4());
        let mut consumer = self
            .client
            .create_consumer(queue, &consumer_tag)
            .await
            .context("创建请求消费者失败")?;

        info!(queue = %queue, "开始消费发布请求");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("收到关闭信号，停止消费");
                    break;
                }
                delivery = consumer.next() => match delivery {
                    Some(Ok(delivery)) => self.handle_delivery(delivery).await,
                    Some(Err(e)) => {
                        error!(queue = %queue, "消费请求失败: {e}");
                        break;
                    }
                    None => {
                        warn!(queue = %queue, "请求消费者已关闭");
                        break;
                    }
                },
            }
        }

        self.client.close().await.context("关闭RabbitMQ连接失败")?;
        self.reader.close().await;
        Ok(())
    }

    async fn handle_delivery(&self, delivery: Delivery) {
        let input: Sdc = match serde_json::from_slice(&delivery.data) {
            Ok(input) => input,
            Err(e) => {
                error!(delivery_tag = delivery.delivery_tag, "请求解码失败: {e}");
                if let Err(e) = self.client.reject_delivery(delivery.delivery_tag).await {
                    warn!("拒绝请求失败: {e}");
                }
                return;
            }
        };

        debug!(
            session_id = %input.session(),
            api_type = %input.api_type,
            accepter = ?input.accepter,
            "收到发布请求"
        );

        let output = process_request(&self.caller, &input).await;

        for queue in &self.config.message_queue.queue_to_response {
            if let Err(e) = self.client.publish_json(queue, &output).await {
                error!(session_id = %input.session(), queue = %queue, "发布响应失败: {e}");
            }
        }

        if let Err(e) = self.client.ack_delivery(delivery.delivery_tag).await {
            warn!(session_id = %input.session(), "确认请求失败: {e}");
        }
    }
}

/// 分发一次请求并生成响应
pub async fn process_request(caller: &DpfmApiCaller, input: &Sdc) -> OutputSdc {
    let mut output = OutputSdc::from_request(input);
    let (message, errors) = caller
        .async_releases(&input.accepter, input, &mut output)
        .await;

    if !errors.is_empty() {
        let joined = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        error!(session_id = %input.session(), "分发失败: {joined}");
        output.api_processing_error = joined;
    }

    output.set_message(message);
    output
}
