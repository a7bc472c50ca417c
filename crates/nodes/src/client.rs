//! HTTP transport for built requests.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::auth::Session;
use crate::catalog::{HttpMethod, RequestSpec};
use crate::NodeError;

/// Tuning knobs for the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-request timeout; the only timeout the nodes apply.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("corbee-gestao-nodes/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// Thin wrapper over `reqwest` that speaks JSON and maps failures to [`NodeError`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, NodeError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| NodeError::Remote {
                status: None,
                message: format!("cannot build HTTP client: {e}"),
            })?;
        Ok(Self { http })
    }

    /// Send `request` against `base_url` and decode the JSON response.
    ///
    /// The session, when given, is consumed: a token serves a single call.
    ///
    /// # Errors
    /// [`NodeError::Remote`] for transport failures, non-2xx statuses and
    /// bodies that are not JSON; [`NodeError::InvalidCredentials`] for an
    /// unusable base URL.
    pub async fn send(
        &self,
        base_url: &str,
        request: &RequestSpec,
        session: Option<Session>,
    ) -> Result<Value, NodeError> {
        let url = request.url(base_url)?;
        debug!("{} {}", request.method.as_str(), url.path());

        let mut builder = self.http.request(method(request.method), url);
        if let Some(session) = session {
            builder = builder.bearer_auth(session.into_token());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| NodeError::Remote {
            status: None,
            message: e.to_string(),
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| NodeError::Remote {
            status: Some(status.as_u16()),
            message: format!("cannot read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(NodeError::Remote {
                status: Some(status.as_u16()),
                message: remote_message(&text)
                    .or_else(|| status.canonical_reason().map(str::to_owned))
                    .unwrap_or_else(|| "request failed".to_owned()),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| NodeError::Remote {
            status: Some(status.as_u16()),
            message: format!("malformed response body: {e}"),
        })
    }
}

fn method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

/// The remote's own explanation: its `message` field, else the raw text.
fn remote_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => json
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .or_else(|| Some(trimmed.to_owned())),
        Err(_) => Some(trimmed.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_message_prefers_the_message_field() {
        assert_eq!(
            remote_message(r#"{"message":"Proposta não encontrada","code":404}"#).as_deref(),
            Some("Proposta não encontrada")
        );
        assert_eq!(remote_message("Bad Gateway").as_deref(), Some("Bad Gateway"));
        assert_eq!(remote_message("  "), None);
    }
}
