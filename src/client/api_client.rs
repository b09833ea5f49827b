use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::{is_token_expired, RefreshClient, TokenService, TokenStore};
use crate::config::{is_public_endpoint, ApiConfig};
use crate::error::ApiError;
use crate::resilience::CircuitBreaker;

/// Maximum number of 401-triggered refresh-and-retry rounds for one logical
/// request. Past the cap the 401 is surfaced as-is.
const MAX_AUTH_RETRIES: u32 = 3;

/// Backend client with authentication continuity and failure protection.
///
/// Generic over the refresh transport and the token store so the whole
/// pipeline runs against mocks in tests. Construct once and share by `Arc`;
/// the circuit breaker streak is only meaningful process-wide.
pub struct ApiClient<C, S> {
    http: reqwest::Client,
    config: ApiConfig,
    tokens: Arc<TokenService<C, S>>,
    breaker: Arc<CircuitBreaker>,
}

impl<C, S> ApiClient<C, S>
where
    C: RefreshClient + 'static,
    S: TokenStore + 'static,
{
    /// Build a client over shared token and breaker state.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(
        config: ApiConfig,
        tokens: Arc<TokenService<C, S>>,
        breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { http, config, tokens, breaker })
    }

    /// The shared token service.
    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenService<C, S>> {
        &self.tokens
    }

    /// The shared circuit breaker.
    #[must_use]
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// `GET` a typed resource.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self.execute(Method::GET, path, None).await?;
        decode(value)
    }

    /// `POST` a body, decoding a typed response.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let body = encode(body)?;
        let value = self.execute(Method::POST, path, Some(body)).await?;
        decode(value)
    }

    /// `POST` without a body, decoding a typed response.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self.execute(Method::POST, path, None).await?;
        decode(value)
    }

    /// `PUT` a body, decoding a typed response.
    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let body = encode(body)?;
        let value = self.execute(Method::PUT, path, Some(body)).await?;
        decode(value)
    }

    /// `DELETE` a resource, discarding any response body.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// Run one logical request through the full pipeline.
    ///
    /// Public endpoints bypass every auth step. Protected requests get a
    /// proactive refresh when the stored access token is absent or inside
    /// its expiry buffer, and a bounded refresh-and-retry loop on 401.
    /// Exactly one breaker success or failure is recorded per logical
    /// request, however many retry rounds it took.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = self.config.api_url(path);
        let public = is_public_endpoint(path);
        let mut retries = 0u32;

        loop {
            let bearer = if public { None } else { self.current_access_token().await };

            let mut request = self.http.request(method.clone(), &url);
            if let Some(token) = &bearer {
                request = request.bearer_auth(token);
            }
            if let Some(body) = &body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(err) => {
                    if self.breaker.is_open() {
                        return Err(self.circuit_open());
                    }
                    self.breaker.record_failure();
                    return Err(ApiError::Transport(err));
                }
            };

            let status = response.status();
            if status.is_success() {
                self.breaker.record_success();
                return parse_body(response).await;
            }

            // Failed responses consult the gate first; a rejection while the
            // circuit is open is reported as such and not counted again.
            if self.breaker.is_open() {
                return Err(self.circuit_open());
            }

            if status == StatusCode::UNAUTHORIZED && !public {
                retries += 1;
                if retries <= MAX_AUTH_RETRIES {
                    debug!(%url, retries, "401 on protected endpoint, refreshing token");
                    if self.tokens.perform_token_refresh().await.is_some() {
                        continue;
                    }
                    // Refresh failed; the 401 below is the final answer.
                } else {
                    warn!(%url, "auth retry budget exhausted");
                }
            }

            self.breaker.record_failure();
            return Err(status_error(response).await);
        }
    }

    /// Stored access token, refreshed proactively when it sits inside the
    /// expiry buffer. An absent token is not refreshed here and a failed
    /// proactive refresh yields `None`: either way the request goes out
    /// unauthenticated and the 401 path takes over.
    async fn current_access_token(&self) -> Option<String> {
        match self.tokens.access_token().await {
            Some(token) if is_token_expired(Some(&token)) => {
                debug!("access token expiring, refreshing proactively");
                self.tokens.perform_token_refresh().await
            }
            other => other,
        }
    }

    fn circuit_open(&self) -> ApiError {
        ApiError::CircuitOpen { retry_in: self.breaker.remaining_open_time() }
    }
}

fn encode(body: &impl Serialize) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|err| ApiError::InvalidRequest(err.to_string()))
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|err| ApiError::InvalidRequest(err.to_string()))
}

async fn parse_body(response: reqwest::Response) -> Result<Value, ApiError> {
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }
    let value: Value = response.json().await?;
    Ok(unwrap_data(value))
}

// Successful payloads arrive either as `{ "data": ... }` or flat.
fn unwrap_data(mut value: Value) -> Value {
    if let Value::Object(map) = &mut value {
        if let Some(data) = map.remove("data") {
            return data;
        }
    }
    value
}

async fn status_error(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| {
            body.get("message")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default();
    ApiError::Status { status, message }
}

#[cfg(test)]
mod tests {
    //! Unit tests for response shaping; the pipeline itself is covered by
    //! the wiremock integration tests.

    use serde_json::json;

    use super::*;

    #[test]
    fn unwraps_data_envelope() {
        let value = unwrap_data(json!({"data": {"id": 1}}));
        assert_eq!(value, json!({"id": 1}));
    }

    #[test]
    fn passes_flat_payloads_through() {
        let value = unwrap_data(json!({"id": 1}));
        assert_eq!(value, json!({"id": 1}));

        let value = unwrap_data(json!([1, 2, 3]));
        assert_eq!(value, json!([1, 2, 3]));
    }

    #[test]
    fn decode_error_is_invalid_request() {
        let err = decode::<u32>(json!("not a number")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }
}
