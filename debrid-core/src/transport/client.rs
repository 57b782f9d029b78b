//! reqwest-backed HTTP client

use async_trait::async_trait;

use super::types::{HttpClient, HttpRequest, HttpResponse};
use crate::config::HttpConfig;
use crate::errors::TransportError;

/// Production HTTP client with a per-request deadline.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates client using timeout and user agent from configuration.
    ///
    /// # Errors
    /// - `TransportError::Network` - TLS backend or client builder failure
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(3))
            .build()?;
        Ok(Self { client })
    }

    /// Wraps an existing reqwest client, keeping its settings.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(request.method, request.url);

        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!("HTTP request failed: {}", e);
            TransportError::from(e)
        })?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}
