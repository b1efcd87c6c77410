//! # 数据模型
//!
//! 发布服务在各层之间传递的数据结构。
//!
//! - [`Sdc`] - 输入读取器解析后的请求
//! - [`OutputSdc`] / [`Message`] - 交给输出格式化器的响应
//! - [`Header`] - Header accepter 对应的可发布实体
//! - [`RemoteRequest`] / [`RemoteReply`] - 发往 SQL 处理 worker 的会话请求与其响应
//! - [`RuntimeSession`] - 一次调用内贯穿全程的关联句柄
//!
//! 外层信封字段使用 snake_case，业务实体字段使用 PascalCase，与数据平台其他服务的
//! JSON 约定保持一致。

pub mod header;
pub mod remote;
pub mod request;
pub mod response;
pub mod session;

pub use header::*;
pub use remote::*;
pub use request::*;
pub use response::*;
pub use session::*;
