pub mod block;
pub mod board;
pub mod config;

pub use block::*;
pub use board::*;
pub use config::*;
