//! Authenticated JSON transport shared by all provider adapters.
//!
//! Resolves paths against the provider base URL, places the credential,
//! retries rate-limited responses with a fixed delay, decodes JSON and runs
//! the provider's envelope check.

pub mod client;
pub mod types;

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

pub use client::ReqwestClient;
pub use types::{AuthPlacement, HttpClient, HttpRequest, HttpResponse, RequestOptions};

use crate::config::{DebridConfig, RetryConfig};
use crate::errors::{DebridError, TransportError};
use crate::types::Provider;

/// Inspects a decoded body for a provider-signaled application error.
pub type ResponseCheck = fn(&Value) -> Result<(), DebridError>;

const RATE_LIMITED: u16 = 429;
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Per-adapter transport configuration.
///
/// Fixed by each adapter: where the token goes, which base URL requests
/// resolve against, and how the provider's error envelope looks.
#[derive(Debug, Clone)]
pub struct TransportProfile {
    pub provider: Provider,
    pub base_url: &'static str,
    pub auth: AuthPlacement,
    pub check: ResponseCheck,
}

/// Authenticated request executor for one provider.
pub struct Transport {
    provider: Provider,
    base_url: Url,
    auth: AuthPlacement,
    check: ResponseCheck,
    token: RwLock<Option<String>>,
    client: Arc<dyn HttpClient>,
    retry: RetryConfig,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url.as_str())
            .field("auth", &self.auth)
            .field("has_token", &self.token.read().is_some())
            .finish()
    }
}

impl Transport {
    /// Creates transport for the given profile.
    ///
    /// # Errors
    /// - `DebridError::InvalidConfiguration` - Base URL cannot be parsed
    pub fn new(
        profile: TransportProfile,
        client: Arc<dyn HttpClient>,
        config: &DebridConfig,
    ) -> Result<Self, DebridError> {
        Self::with_base_url(profile.base_url, profile, client, config)
    }

    /// Creates transport with an overridden base URL (staging hosts, proxies).
    ///
    /// # Errors
    /// - `DebridError::InvalidConfiguration` - Base URL cannot be parsed
    pub fn with_base_url(
        base_url: &str,
        profile: TransportProfile,
        client: Arc<dyn HttpClient>,
        config: &DebridConfig,
    ) -> Result<Self, DebridError> {
        // Url::join drops the last segment unless the base ends with a slash
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized).map_err(|e| DebridError::InvalidConfiguration {
            reason: format!("Invalid base URL '{base_url}': {e}"),
        })?;

        Ok(Self {
            provider: profile.provider,
            base_url,
            auth: profile.auth,
            check: profile.check,
            token: RwLock::new(None),
            client,
            retry: config.retry.clone(),
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Stores the credential used by subsequent requests.
    ///
    /// # Errors
    /// - `DebridError::InvalidCredential` - Token is empty or whitespace
    pub fn set_token(&self, token: &str) -> Result<(), DebridError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DebridError::InvalidCredential);
        }
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    /// Current credential.
    ///
    /// # Errors
    /// - `DebridError::MissingCredential` - No token set yet
    pub fn token(&self) -> Result<String, DebridError> {
        self.token.read().clone().ok_or(DebridError::MissingCredential)
    }

    /// Issues a request and returns the decoded JSON body.
    ///
    /// Empty successful bodies decode to `Value::Null`.
    ///
    /// # Errors
    /// - `DebridError::MissingCredential` - No token set
    /// - `DebridError::Transport` - Network failure, error status, exhausted 429 retries, invalid JSON
    /// - `DebridError::Provider` - Provider envelope signaled an application error
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Value, DebridError> {
        let token = self.token()?;
        let request = self.build_request(method, path, options, &token)?;

        tracing::debug!(
            "{} request: {} {}",
            self.provider,
            request.method,
            request.url.path()
        );

        let response = self.send_with_retry(request).await?;
        self.decode(response)
    }

    /// Issues a request and decodes the body into a typed partial schema.
    ///
    /// An empty body yields `T::default()`.
    ///
    /// # Errors
    /// Same as [`Transport::request`], plus `TransportError::Decode` when the
    /// body does not match `T`.
    pub async fn request_as<T>(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, DebridError>
    where
        T: DeserializeOwned + Default,
    {
        let value = self.request(method, path, options).await?;
        decode_value(value)
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
        token: &str,
    ) -> Result<HttpRequest, DebridError> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| DebridError::InvalidConfiguration {
                reason: format!("Invalid request path '{path}': {e}"),
            })?;

        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        let mut query = options.query;

        match self.auth {
            AuthPlacement::BearerHeader => {
                headers.push(("Authorization".to_string(), format!("Bearer {token}")));
            }
            AuthPlacement::QueryParam(name) => {
                query.retain(|(key, _)| key != name);
                query.push((name.to_string(), token.to_string()));
            }
        }

        Ok(HttpRequest {
            method,
            url,
            headers,
            query,
            form: options.form,
        })
    }

    async fn send_with_retry(&self, request: HttpRequest) -> Result<HttpResponse, DebridError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let response = self.client.send(request.clone()).await?;
            if response.status != RATE_LIMITED {
                return Ok(response);
            }

            if attempt >= max_attempts {
                tracing::warn!(
                    "{} rate limited {} on {} attempts, giving up",
                    self.provider,
                    request.url.path(),
                    attempt
                );
                return Err(TransportError::Status {
                    status: RATE_LIMITED,
                    message: format!("Rate limited after {attempt} attempts"),
                }
                .into());
            }

            tracing::warn!(
                "{} rate limited {} (attempt {}/{}), retrying in {:?}",
                self.provider,
                request.url.path(),
                attempt,
                max_attempts,
                self.retry.delay
            );
            tokio::time::sleep(self.retry.delay).await;
            attempt += 1;
        }
    }

    fn decode(&self, response: HttpResponse) -> Result<Value, DebridError> {
        let status = response.status;
        let body = response.body.trim();

        if body.is_empty() {
            if status >= 400 {
                return Err(TransportError::Status {
                    status,
                    message: "Empty response".to_string(),
                }
                .into());
            }
            return Ok(Value::Null);
        }

        let value: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(_) if status >= 400 => {
                return Err(TransportError::Status {
                    status,
                    message: truncate(body),
                }
                .into());
            }
            Err(e) => {
                tracing::warn!("{} returned malformed JSON: {}", self.provider, e);
                return Err(TransportError::from(e).into());
            }
        };

        (self.check)(&value)?;

        if status >= 400 {
            return Err(TransportError::Status {
                status,
                message: truncate(body),
            }
            .into());
        }

        Ok(value)
    }
}

/// Decodes a JSON value into a typed schema; `Null` yields the default.
///
/// # Errors
/// - `TransportError::Decode` - Value does not match the schema
pub fn decode_value<T>(value: Value) -> Result<T, DebridError>
where
    T: DeserializeOwned + Default,
{
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value).map_err(|e| TransportError::from(e).into())
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
