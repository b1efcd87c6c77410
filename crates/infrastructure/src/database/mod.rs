pub mod header_reader;

pub use header_reader::*;
