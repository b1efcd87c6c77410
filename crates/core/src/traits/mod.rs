pub mod header_reader;
pub mod message_queue;

pub use header_reader::*;
pub use message_queue::*;
