//! `GestaoNode`: the per-item dispatcher shared by the three Corbee nodes.
//!
//! For every item:
//! 1. Resolves the `operation` parameter against the catalog and the node's
//!    own operation list.
//! 2. Builds the typed [`Operation`]; missing fields fail here, before any
//!    network call.
//! 3. Logs in (bearer operations only).
//! 4. Sends the one request and returns `{ corbeeResponse, operation }`.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::auth::Authenticator;
use crate::catalog::{resolve, AuthMode, NodeKind, Operation};
use crate::client::{ApiClient, ClientConfig};
use crate::credentials::Credentials;
use crate::description::NodeDescription;
use crate::traits::{ExecutableNode, ExecutionContext};
use crate::NodeError;

/// Key under which the decoded response is attached to the item.
pub const RESPONSE_KEY: &str = "corbeeResponse";

const MY_DATA_GAP: &str =
    "the API publishes no endpoint for the logged-in broker's own data; look the broker up by ID instead";

#[derive(Debug, Clone)]
pub struct GestaoNode {
    kind: NodeKind,
    client: ApiClient,
    authenticator: Authenticator,
}

impl GestaoNode {
    pub fn new(kind: NodeKind, config: &ClientConfig) -> Result<Self, NodeError> {
        let client = ApiClient::new(config)?;
        Ok(Self::with_client(kind, client))
    }

    pub fn with_client(kind: NodeKind, client: ApiClient) -> Self {
        Self {
            kind,
            authenticator: Authenticator::new(client.clone()),
            client,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn description(&self) -> NodeDescription {
        NodeDescription::for_node(self.kind)
    }

    /// Resolve and validate an item's parameters without touching the network.
    ///
    /// # Errors
    /// Configuration errors only.
    pub fn prepare(&self, params: &Map<String, Value>) -> Result<Operation, NodeError> {
        let id = params
            .get("operation")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let spec = resolve(id)?;
        if !self.kind.offers(spec.kind) {
            return Err(NodeError::UnknownOperation(id.to_owned()));
        }

        Operation::from_parameters(spec, params)
    }

    async fn dispatch(&self, operation: &Operation, credentials: &Credentials) -> Result<Value, NodeError> {
        let spec = operation.spec();

        let Some(request) = operation.request() else {
            return Err(NodeError::Unsupported {
                operation: spec.id,
                reason: MY_DATA_GAP,
            });
        };

        match spec.auth {
            AuthMode::Login => self.authenticator.login(credentials).await,
            AuthMode::Bearer => {
                let session = self.authenticator.authenticate(credentials).await?;
                debug!("authenticated");
                self.client
                    .send(credentials.base_url(), &request, Some(session))
                    .await
            }
        }
    }
}

#[async_trait]
impl ExecutableNode for GestaoNode {
    #[instrument(
        skip(self, input, ctx),
        fields(node = self.kind.name(), item = ctx.item_index, operation = tracing::field::Empty)
    )]
    async fn execute(&self, input: Value, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        let empty = Map::new();
        let params = input.as_object().unwrap_or(&empty);

        let operation = self.prepare(params).map_err(|e| {
            warn!("rejected item parameters: {e}");
            e
        })?;
        let id = operation.spec().id;
        tracing::Span::current().record("operation", id);

        let response = self.dispatch(&operation, &ctx.credentials).await?;
        info!("operation '{id}' completed");

        Ok(json!({
            RESPONSE_KEY: response,
            "operation": id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OperationKind;

    fn node(kind: NodeKind) -> GestaoNode {
        GestaoNode::new(kind, &ClientConfig::default()).unwrap()
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn prepare_rejects_operations_outside_the_node() {
        let usuario = node(NodeKind::Usuario);
        let err = usuario
            .prepare(&params(json!({ "operation": "listNotifications" })))
            .unwrap_err();
        assert_eq!(err, NodeError::UnknownOperation("listNotifications".into()));

        let ok = usuario.prepare(&params(json!({ "operation": "listManagers" }))).unwrap();
        assert_eq!(ok.kind(), OperationKind::ListManagers);
    }

    #[test]
    fn prepare_without_operation_is_unknown() {
        let err = node(NodeKind::Gestao).prepare(&Map::new()).unwrap_err();
        assert_eq!(err, NodeError::UnknownOperation(String::new()));
    }

    #[test]
    fn description_matches_kind() {
        let desc = node(NodeKind::Corretor).description();
        assert_eq!(desc.name, "corbeeGestaoCorretor");
    }
}
