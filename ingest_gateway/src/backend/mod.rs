//! The storage backend abstraction consumed by the dispatch pipeline.

mod r#trait;
pub use r#trait::*;

pub mod mock;
pub mod nop;
