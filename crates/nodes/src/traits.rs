//! The `ExecutableNode` trait: the contract every node must fulfil.

use async_trait::async_trait;
use serde_json::Value;

use crate::credentials::Credentials;
use crate::NodeError;

/// Per-item context passed to a node.
///
/// Defined here (in the nodes crate) so both the engine and individual node
/// implementations can import it without a circular dependency.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// ID of the batch run this item belongs to.
    pub execution_id: uuid::Uuid,
    /// Position of the item in the batch input.
    pub item_index: usize,
    /// Credentials resolved by the host for this run.
    pub credentials: Credentials,
}

/// The core node trait.
#[async_trait]
pub trait ExecutableNode: Send + Sync {
    /// Execute the node for one item. `input` is the item's parameter object
    /// (`operation` plus the fields it reads); the returned object is merged
    /// into the item's data.
    async fn execute(
        &self,
        input: Value,
        ctx: &ExecutionContext,
    ) -> Result<Value, NodeError>;
}
