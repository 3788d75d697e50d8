pub mod client;
pub mod config_io;
pub mod memory;

pub use client::{ApiError, BlockSource, NotionClient};
pub use memory::MemorySource;
