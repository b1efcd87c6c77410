use article_releases_core::{RemoteReply, SessionResponse};

/// 判断 SQL 处理 worker 的响应是否成功
///
/// 只看 `result` 字段：必须存在、是字符串且严格等于 `"success"`。
pub fn is_success(reply: &RemoteReply) -> bool {
    reply.is_success()
}

pub fn check_result(response: &SessionResponse) -> bool {
    is_success(&response.reply)
}
