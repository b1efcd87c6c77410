pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use config::{AppConfig, DatabaseConfig, MessageQueueConfig, ObservabilityConfig};
pub use errors::*;
pub use models::{
    Accepter, ApiType, Article, Header, Message, OutputSdc, RemoteFunction, RemoteReply,
    RemoteRequest, RuntimeSession, Sdc, SessionResponse,
};
pub use traits::{HeaderReader, SessionRequester};
