//! Batch data passed through the executor.
//!
//! An [`Item`] pairs pass-through data with the parameters the node reads.
//! After a run each item comes back as an [`ItemOutcome`] at the same index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use nodes::NodeError;

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// One input item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Data carried through to the outcome untouched, then patched with the
    /// node's output.
    #[serde(default)]
    pub json: Map<String, Value>,
    /// `operation` plus the fields that operation reads.
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl Item {
    /// An item with no pass-through data.
    ///
    /// A non-object `parameters` value yields an empty parameter map.
    pub fn with_parameters(parameters: Value) -> Self {
        Self {
            json: Map::new(),
            parameters: into_map(parameters),
        }
    }

    pub fn with_json(mut self, json: Value) -> Self {
        self.json = into_map(json);
        self
    }

    /// The `operation` parameter, or `""` when absent.
    pub fn operation(&self) -> &str {
        self.parameters
            .get("operation")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Failure attached to an item when the run continues past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub message: String,
    pub operation: Option<String>,
    /// `configuration`, `auth` or `remote`.
    pub kind: String,
}

impl ItemError {
    pub fn new(operation: &str, error: &NodeError) -> Self {
        Self {
            message: error.to_string(),
            operation: (!operation.is_empty()).then(|| operation.to_owned()),
            kind: error.kind().to_owned(),
        }
    }
}

/// What became of one input item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub index: usize,
    pub json: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ItemError>,
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// The result of a completed batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub execution_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One outcome per input item, in input order.
    pub items: Vec<ItemOutcome>,
}

impl BatchResult {
    /// Number of items that carry an error.
    pub fn failed(&self) -> usize {
        self.items.iter().filter(|item| !item.is_success()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_reads_operation_and_tolerates_non_objects() {
        let item = Item::with_parameters(json!({ "operation": "getBroker", "brokerId": "1" }));
        assert_eq!(item.operation(), "getBroker");

        let odd = Item::with_parameters(json!(["not", "an", "object"])).with_json(json!(7));
        assert_eq!(odd.operation(), "");
        assert!(odd.json.is_empty());
    }

    #[test]
    fn item_error_drops_empty_operation() {
        let err = NodeError::UnknownOperation(String::new());
        let item_error = ItemError::new("", &err);
        assert_eq!(item_error.operation, None);
        assert_eq!(item_error.kind, "configuration");
    }

    #[test]
    fn successful_outcome_serialises_without_error_key() {
        let outcome = ItemOutcome { index: 0, json: Map::new(), error: None };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value, json!({ "index": 0, "json": {} }));
    }
}
