//! Engine-level error types.

use nodes::NodeError;
use thiserror::Error;

/// Errors that end a batch run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An item failed while `continue_on_fail` was off; later items were not run.
    #[error("item {index} failed in operation '{operation}': {source}")]
    ItemFailed {
        index: usize,
        operation: String,
        #[source]
        source: NodeError,
    },
}

impl EngineError {
    /// Index of the item that stopped the run.
    pub fn index(&self) -> usize {
        match self {
            EngineError::ItemFailed { index, .. } => *index,
        }
    }
}
