//! Node-level error type.

use thiserror::Error;

/// Errors returned by a node's `execute` method.
///
/// None of these are retried. The variants fall into three families:
/// - configuration: `UnknownOperation`, `MissingField`, `InvalidField`,
///   `Unsupported`, `InvalidCredentials`; raised before any network call.
/// - `Auth`: the login call failed or returned no token.
/// - `Remote`: the downstream call failed or returned something unusable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NodeError {
    /// The operation id is not in the catalog, or not offered by this node.
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    /// A field the operation requires is absent, null or empty.
    #[error("operation '{operation}' requires field '{field}'")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },

    /// A field is present but has the wrong shape.
    #[error("field '{field}' of operation '{operation}' must be {expected}")]
    InvalidField {
        operation: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    /// The operation is declared but has no backing endpoint.
    #[error("operation '{operation}' is not available: {reason}")]
    Unsupported {
        operation: &'static str,
        reason: &'static str,
    },

    /// The credentials cannot be used to address the API (e.g. a malformed base URL).
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    /// Non-success status, malformed body, or transport failure (`status: None`).
    #[error("remote error{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Remote {
        status: Option<u16>,
        message: String,
    },
}

impl NodeError {
    /// `true` for errors caused by the item's own parameters.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            NodeError::UnknownOperation(_)
                | NodeError::MissingField { .. }
                | NodeError::InvalidField { .. }
                | NodeError::Unsupported { .. }
                | NodeError::InvalidCredentials(_)
        )
    }

    /// Short machine-readable family name, used when errors are attached to items.
    pub fn kind(&self) -> &'static str {
        match self {
            NodeError::Auth(_) => "auth",
            NodeError::Remote { .. } => "remote",
            _ => "configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_mentions_status_only_when_known() {
        let with = NodeError::Remote { status: Some(404), message: "not found".into() };
        let without = NodeError::Remote { status: None, message: "connection refused".into() };
        assert_eq!(with.to_string(), "remote error (404): not found");
        assert_eq!(without.to_string(), "remote error: connection refused");
    }

    #[test]
    fn configuration_family_is_classified() {
        assert!(NodeError::UnknownOperation("x".into()).is_configuration());
        assert!(!NodeError::Auth("no token in response".into()).is_configuration());
        assert_eq!(NodeError::Auth(String::new()).kind(), "auth");
    }
}
