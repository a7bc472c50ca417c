//! Batch execution engine.
//!
//! `BatchExecutor` drives one node over a list of items:
//! 1. Items run strictly one after another, in input order.
//! 2. Each item gets its own `ExecutionContext` carrying the run's credentials.
//! 3. A successful item has the node's output patch merged into its data.
//! 4. A failed item either aborts the run or, with `continue_on_fail`, is
//!    recorded in place and the run moves on.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use nodes::traits::ExecutionContext;
use nodes::{Credentials, ExecutableNode};

use crate::models::{BatchResult, Item, ItemError, ItemOutcome};
use crate::EngineError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the executor.
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfig {
    /// Record failures on the item and keep going instead of aborting.
    pub continue_on_fail: bool,
}

impl ExecutorConfig {
    pub fn continue_on_fail() -> Self {
        Self { continue_on_fail: true }
    }
}

// ---------------------------------------------------------------------------
// BatchExecutor
// ---------------------------------------------------------------------------

/// Runs a single node over a batch of items.
///
/// Holds no per-run state, so one executor can serve any number of runs.
pub struct BatchExecutor {
    node: Arc<dyn ExecutableNode>,
    config: ExecutorConfig,
}

impl BatchExecutor {
    pub fn new(node: Arc<dyn ExecutableNode>, config: ExecutorConfig) -> Self {
        Self { node, config }
    }

    /// Run every item through the node.
    ///
    /// # Errors
    /// Returns [`EngineError::ItemFailed`] for the first failing item when
    /// `continue_on_fail` is off. Items after it are never executed.
    #[instrument(skip(self, items, credentials), fields(items = items.len(), execution_id = tracing::field::Empty))]
    pub async fn run(
        &self,
        items: Vec<Item>,
        credentials: &Credentials,
    ) -> Result<BatchResult, EngineError> {
        let execution_id = Uuid::new_v4();
        tracing::Span::current().record("execution_id", tracing::field::display(execution_id));

        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(items.len());

        for (index, item) in items.into_iter().enumerate() {
            let ctx = ExecutionContext {
                execution_id,
                item_index: index,
                credentials: credentials.clone(),
            };
            let input = Value::Object(item.parameters.clone());

            match self.node.execute(input, &ctx).await {
                Ok(patch) => {
                    let mut json = item.json;
                    merge(&mut json, patch);
                    outcomes.push(ItemOutcome { index, json, error: None });
                }

                Err(source) if self.config.continue_on_fail => {
                    warn!("item {index} failed, continuing: {source}");
                    outcomes.push(ItemOutcome {
                        index,
                        error: Some(ItemError::new(item.operation(), &source)),
                        json: item.json,
                    });
                }

                Err(source) => {
                    error!("item {index} failed, aborting run: {source}");
                    return Err(EngineError::ItemFailed {
                        index,
                        operation: item.operation().to_owned(),
                        source,
                    });
                }
            }
        }

        let result = BatchResult {
            execution_id,
            started_at,
            finished_at: Utc::now(),
            items: outcomes,
        };
        info!(
            "run {} finished: {} items, {} failed",
            execution_id,
            result.items.len(),
            result.failed()
        );

        Ok(result)
    }
}

/// Object patches are merged key by key; anything else lands under `output`.
fn merge(json: &mut Map<String, Value>, patch: Value) {
    match patch {
        Value::Object(fields) => json.extend(fields),
        other => {
            json.insert("output".to_owned(), other);
        }
    }
}
