//! HTTP client for communicating with the aimart marketplace API

use crate::envelope;
use aimart_core::config::ApiConfig;
use aimart_core::{Error, Result};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};

/// API client for the `/v1` REST surface
///
/// Every request carries the bearer token when one is configured. Responses
/// are returned as raw JSON; shaping them into records is the caller's job
/// (see [`crate::envelope`]).
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl ApiClient {
    /// Create a new API client with default transport settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_token: None,
        }
    }

    /// Create a client from configuration, applying the request timeout
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_token: config.api_token.clone(),
        })
    }

    /// Set the bearer token for authentication
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Base URL this client talks to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path under `/v1`
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// `GET /v1/{path}` with query parameters
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` on transport failure and `Error::Http` on a
    /// non-2xx status.
    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        let request = self.client.get(self.url(path)).query(query);
        self.execute(Method::GET, path, request).await
    }

    /// Send a request with an optional JSON body
    ///
    /// # Errors
    ///
    /// Returns `Error::Network` on transport failure and `Error::Http` on a
    /// non-2xx status or a 2xx body reporting `"success": false`.
    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let mut request = self.client.request(method.clone(), self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(method, path, request).await
    }

    async fn execute(&self, method: Method, path: &str, request: RequestBuilder) -> Result<Value> {
        let request = match self.api_token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        };

        debug!(%method, path, "sending API request");
        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(format!("{method} {path} failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("failed to read response body: {e}")))?;
        let body = parse_body(&text);

        if !status.is_success() {
            warn!(%method, path, status = status.as_u16(), "API returned error");
            return Err(Error::Http {
                status: status.as_u16(),
                message: envelope::message(&body),
            });
        }

        if envelope::reports_failure(&body) {
            warn!(%method, path, status = status.as_u16(), "API reported failure");
            return Err(Error::Http {
                status: status.as_u16(),
                message: envelope::message(&body),
            });
        }

        Ok(body)
    }
}

/// Empty and non-JSON bodies become `null`
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|e| {
        debug!(error = %e, "response body is not JSON");
        Value::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:8000", "promocodes", "http://localhost:8000/v1/promocodes")]
    #[case("http://localhost:8000/", "/promocodes/p1", "http://localhost:8000/v1/promocodes/p1")]
    #[case("https://api.example.com/", "users/u1/toggle-status", "https://api.example.com/v1/users/u1/toggle-status")]
    fn test_url_joining(#[case] base: &str, #[case] path: &str, #[case] expected: &str) {
        assert_eq!(ApiClient::new(base).url(path), expected);
    }

    #[test]
    fn test_from_config_copies_token() {
        let config = ApiConfig {
            api_token: Some("secret".into()),
            ..ApiConfig::default()
        };
        let client = ApiClient::from_config(&config);
        assert!(client.is_ok_and(|c| c.api_token.as_deref() == Some("secret")));
    }

    #[rstest]
    #[case("", Value::Null)]
    #[case("   ", Value::Null)]
    #[case("<html>Bad gateway</html>", Value::Null)]
    #[case(r#"{"ok":true}"#, serde_json::json!({"ok": true}))]
    fn test_parse_body(#[case] text: &str, #[case] expected: Value) {
        assert_eq!(parse_body(text), expected);
    }
}
