use article_releases_core::{Header, Message};

/// 把各 accepter 的结果包装成输出消息
pub fn build(header: Option<Header>) -> Message {
    Message { header }
}
