pub mod app_config;
pub mod database;
pub mod message_queue;
pub mod observability;

// Re-export main types for easier imports
pub use app_config::AppConfig;
pub use database::DatabaseConfig;
pub use message_queue::MessageQueueConfig;
pub use observability::ObservabilityConfig;
