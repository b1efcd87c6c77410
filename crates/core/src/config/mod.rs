//! 配置管理
//!
//! 配置按 默认值 → TOML 文件 → 环境变量 的顺序合并，加载后逐节校验。
//!
//! ```rust,no_run
//! use article_releases_core::config::AppConfig;
//!
//! let config = AppConfig::load(Some("config/article-releases.toml")).unwrap();
//! let queue = config.message_queue.queue_to_sql().unwrap();
//! println!("SQL处理队列: {queue}");
//! ```

pub mod models;

pub use models::{AppConfig, DatabaseConfig, MessageQueueConfig, ObservabilityConfig};
