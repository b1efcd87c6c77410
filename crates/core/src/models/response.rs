use serde::{Deserialize, Serialize};

use super::{Header, Sdc};

/// 按 accepter 种类聚合的发布结果
///
/// 某个 accepter 失败时对应字段为 `None`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
    pub header: Option<Header>,
}

/// 交给输出格式化器的响应（SDC）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSdc {
    pub connection_key: String,
    pub result: bool,
    pub redis_key: String,
    pub filepath: String,
    pub api_status_code: i32,
    pub runtime_session_id: String,
    pub business_partner: i32,
    pub service_label: String,
    pub api_type: String,
    pub message: Option<Message>,
    pub api_schema: String,
    pub accepter: Vec<String>,
    pub deleted: bool,
    /// `None` 表示没有观察到 SQL 更新失败
    pub sql_update_result: Option<bool>,
    pub sql_update_error: String,
    pub api_processing_result: Option<bool>,
    pub api_processing_error: String,
}

impl OutputSdc {
    /// 以输入请求的信封字段初始化响应
    pub fn from_request(sdc: &Sdc) -> Self {
        Self {
            connection_key: sdc.connection_key.clone(),
            result: sdc.result,
            redis_key: sdc.redis_key.clone(),
            filepath: sdc.filepath.clone(),
            api_status_code: sdc.api_status_code,
            runtime_session_id: sdc.runtime_session_id.clone(),
            business_partner: sdc.business_partner,
            service_label: sdc.service_label.clone(),
            api_type: sdc.api_type.clone(),
            api_schema: sdc.api_schema.clone(),
            accepter: sdc.accepter.clone(),
            deleted: sdc.deleted,
            ..Default::default()
        }
    }

    /// 记录 SQL 更新失败
    pub fn record_sql_update_failure(&mut self, error: impl Into<String>) {
        self.sql_update_result = Some(false);
        self.sql_update_error = error.into();
    }

    /// 写入分发结果并计算整体处理结果
    ///
    /// 没有产生消息或任一 SQL 更新失败时处理结果为 `false`。
    pub fn set_message(&mut self, message: Option<Message>) {
        let succeeded = message.is_some() && self.sql_update_result != Some(false);
        self.api_processing_result = Some(succeeded);
        if !succeeded && self.api_processing_error.is_empty() {
            self.api_processing_error = if message.is_none() {
                format!("API类型 {} 未产生响应", self.api_type)
            } else {
                self.sql_update_error.clone()
            };
        }
        self.message = message;
    }
}
