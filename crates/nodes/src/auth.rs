//! Login against the Corbee Gestão API.
//!
//! Every item logs in on its own; tokens are never cached or shared.

use std::fmt;

use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::{HttpMethod, RequestSpec};
use crate::client::ApiClient;
use crate::credentials::Credentials;
use crate::NodeError;

pub const LOGIN_PATH: &str = "/api/v2/login";

/// Bearer token for exactly one downstream call.
pub struct Session {
    token: String,
}

impl Session {
    pub fn into_token(self) -> String {
        self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"***").finish()
    }
}

#[derive(Debug, Clone)]
pub struct Authenticator {
    client: ApiClient,
}

impl Authenticator {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Issue the login call and return the decoded response untouched.
    ///
    /// # Errors
    /// [`NodeError::Auth`] when the call fails, is rejected, or answers with
    /// a body that is not JSON.
    pub async fn login(&self, credentials: &Credentials) -> Result<Value, NodeError> {
        let request = RequestSpec::new(HttpMethod::Post, LOGIN_PATH).with_body(credentials.login_body());

        debug!(login = credentials.login(), "logging in");
        self.client
            .send(credentials.base_url(), &request, None)
            .await
            .map_err(|e| match e {
                NodeError::Remote { status: Some(status), message } if (200..300).contains(&status) => {
                    NodeError::Auth(format!("login response unreadable: {message}"))
                }
                NodeError::Remote { status: Some(status), message } => {
                    NodeError::Auth(format!("login rejected ({status}): {message}"))
                }
                NodeError::Remote { status: None, message } => {
                    NodeError::Auth(format!("login call failed: {message}"))
                }
                other => other,
            })
    }

    /// Log in and extract the token at `data.jwt`.
    ///
    /// # Errors
    /// [`NodeError::Auth`] when the login fails or the response carries no token.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Session, NodeError> {
        let response = self.login(credentials).await?;

        match token_from(&response) {
            Some(token) => Ok(Session { token: token.to_owned() }),
            None => {
                warn!(login = credentials.login(), "login response carried no token");
                Err(NodeError::Auth("no token in response".to_owned()))
            }
        }
    }
}

fn token_from(response: &Value) -> Option<&str> {
    response
        .pointer("/data/jwt")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_is_read_from_data_jwt() {
        assert_eq!(token_from(&json!({ "data": { "jwt": "abc" } })), Some("abc"));
        assert_eq!(token_from(&json!({ "data": { "jwt": "" } })), None);
        assert_eq!(token_from(&json!({ "jwt": "abc" })), None);
        assert_eq!(token_from(&Value::Null), None);
    }

    #[test]
    fn session_debug_hides_token() {
        let session = Session { token: "secret-jwt".into() };
        assert!(!format!("{session:?}").contains("secret-jwt"));
    }
}
