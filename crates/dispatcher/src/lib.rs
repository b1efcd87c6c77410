//! 发布请求分发核心
//!
//! 按API类型选择策略，按 accepter 顺序逐个发起会话请求，并把结果组装成响应。

pub mod assembler;
pub mod caller;
pub mod classifier;
pub mod pipeline;
pub mod releaser;

pub use caller::DpfmApiCaller;
pub use classifier::{check_result, is_success};
pub use pipeline::{AccepterHandler, AccepterPipeline, ReleaseOutcomes, Released};
pub use releaser::{HeaderReleaser, HEADER_RELEASE_ERROR};
