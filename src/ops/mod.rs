pub mod board_ops;
pub mod collect;
pub mod deliverable;
pub mod filter;
pub mod milestone;
pub mod reconcile;
pub mod traverse;

pub use traverse::{LoadError, load_board};
