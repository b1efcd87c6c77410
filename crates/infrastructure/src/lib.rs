pub mod database;
pub mod message_queue;
pub mod session;

pub use database::*;
pub use message_queue::*;
pub use session::*;
