//! `engine` crate: batch items, the batch executor, and run-level errors.

pub mod error;
pub mod executor;
pub mod models;

pub use error::EngineError;
pub use executor::{BatchExecutor, ExecutorConfig};
pub use models::{BatchResult, Item, ItemError, ItemOutcome};
