use async_trait::async_trait;

use crate::{
    models::{Header, Sdc},
    ReleaseResult,
};

/// Header 远程读取接口
#[async_trait]
pub trait HeaderReader: Send + Sync {
    /// 读取请求所指文章的当前 Header，不存在时返回 `None`
    async fn read_header(&self, request: &Sdc) -> ReleaseResult<Option<Header>>;
}
