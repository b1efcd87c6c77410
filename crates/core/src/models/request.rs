use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::RuntimeSession;
use crate::errors::ReleaseError;

/// 输入读取器解析出的请求（SDC）
///
/// 一次 API 调用的只读输入，由输入读取器从 broker 消息中解码。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sdc {
    #[serde(default)]
    pub connection_key: String,
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub redis_key: String,
    #[serde(default)]
    pub filepath: String,
    #[serde(default)]
    pub api_status_code: i32,
    #[serde(default)]
    pub runtime_session_id: String,
    #[serde(default)]
    pub business_partner: i32,
    #[serde(default)]
    pub service_label: String,
    #[serde(default)]
    pub api_type: String,
    #[serde(rename = "Article")]
    pub article: Article,
    #[serde(default)]
    pub api_schema: String,
    #[serde(default)]
    pub accepter: Vec<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl Sdc {
    /// 本次调用的会话句柄
    pub fn session(&self) -> RuntimeSession {
        RuntimeSession::new(self.runtime_session_id.as_str())
    }

    /// 解析API类型
    pub fn api_type(&self) -> Result<ApiType, ReleaseError> {
        self.api_type.parse()
    }
}

/// 请求中携带的文章数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Article {
    pub article: i32,
    /// `None` 表示请求未指定发布状态
    #[serde(default, alias = "IsReleaseled")]
    pub is_released: Option<bool>,
}

/// API类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiType {
    Releases,
}

impl ApiType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiType::Releases => "releases",
        }
    }
}

impl FromStr for ApiType {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "releases" => Ok(ApiType::Releases),
            other => Err(ReleaseError::UnknownApiType(other.to_string())),
        }
    }
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 请求中需要发布的子资源种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accepter {
    Header,
}

impl Accepter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Accepter::Header => "Header",
        }
    }
}

impl FromStr for Accepter {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Header" => Ok(Accepter::Header),
            other => Err(ReleaseError::UnknownAccepter(other.to_string())),
        }
    }
}

impl fmt::Display for Accepter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
