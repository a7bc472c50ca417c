//! `MockNode`: a test double for `ExecutableNode`.
//!
//! Lets the batch executor be exercised without a remote API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::gestao::RESPONSE_KEY;
use crate::{traits::ExecutionContext, ExecutableNode, NodeError};

/// A mock node that records every call it receives and answers with a
/// programmer-specified response, or an error for chosen item indexes.
pub struct MockNode {
    /// Label used in test assertions.
    pub name: String,
    /// Returned under `corbeeResponse` on success.
    pub response: Value,
    /// Item index → error to return instead.
    pub failures: HashMap<usize, NodeError>,
    /// All inputs seen by this node (in call order).
    pub calls: Arc<Mutex<Vec<Value>>>,
}

impl MockNode {
    /// Create a mock that always succeeds with the given response.
    pub fn returning(name: impl Into<String>, response: Value) -> Self {
        Self {
            name: name.into(),
            response,
            failures: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make the item at `index` fail with `error`.
    pub fn failing_at(mut self, index: usize, error: NodeError) -> Self {
        self.failures.insert(index, error);
        self
    }

    /// Number of times this node has been executed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ExecutableNode for MockNode {
    async fn execute(&self, input: Value, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(input.clone());
        }

        if let Some(error) = self.failures.get(&ctx.item_index) {
            return Err(error.clone());
        }

        Ok(json!({
            RESPONSE_KEY: self.response,
            "operation": input.get("operation").cloned().unwrap_or(Value::Null),
            "node": self.name,
        }))
    }
}
