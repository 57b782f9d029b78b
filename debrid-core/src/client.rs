//! Provider-agnostic facade over the adapters.

use std::sync::Arc;

use crate::config::DebridConfig;
use crate::errors::DebridError;
use crate::providers::{create_adapter, create_adapter_with_client};
use crate::strategy::DebridStrategy;
use crate::transport::HttpClient;
use crate::types::{File, Provider};

/// Entry point that routes every operation to the selected provider.
///
/// The provider can be switched at runtime; the stored token carries over
/// to the new adapter. Operations fail with
/// `DebridError::InvalidConfiguration` until both a provider and a token
/// are set.
#[derive(Debug, Default)]
pub struct DebridClient {
    config: DebridConfig,
    http: Option<Arc<dyn HttpClient>>,
    adapter: Option<Box<dyn DebridStrategy>>,
    token: Option<String>,
}

impl DebridClient {
    /// Creates facade without a provider.
    pub fn new(config: DebridConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Creates facade whose adapters all share `client`.
    pub fn with_http_client(config: DebridConfig, client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http: Some(client),
            ..Self::default()
        }
    }

    /// Creates facade already bound to `provider`.
    ///
    /// # Errors
    /// - `DebridError::Transport` - HTTP client cannot be built
    pub fn with_provider(provider: Provider, config: DebridConfig) -> Result<Self, DebridError> {
        let mut client = Self::new(config);
        client.use_provider(provider)?;
        Ok(client)
    }

    /// Switches to `provider`, applying the stored token if there is one.
    ///
    /// # Errors
    /// - `DebridError::Transport` - HTTP client cannot be built
    pub fn use_provider(&mut self, provider: Provider) -> Result<&mut Self, DebridError> {
        let adapter = match &self.http {
            Some(http) => create_adapter_with_client(provider, http.clone(), &self.config)?,
            None => create_adapter(provider, &self.config)?,
        };
        if let Some(token) = &self.token {
            adapter.set_token(token)?;
        }

        tracing::debug!("Debrid client now uses {}", provider);
        self.adapter = Some(adapter);
        Ok(self)
    }

    /// Stores the token and forwards it to the current adapter.
    ///
    /// # Errors
    /// - `DebridError::InvalidCredential` - Token is empty
    pub fn set_token(&mut self, token: &str) -> Result<&mut Self, DebridError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DebridError::InvalidCredential);
        }
        if let Some(adapter) = &self.adapter {
            adapter.set_token(token)?;
        }
        self.token = Some(token.to_string());
        Ok(self)
    }

    /// Provider currently selected.
    pub fn provider(&self) -> Option<Provider> {
        self.adapter.as_ref().map(|adapter| adapter.provider())
    }

    fn adapter(&self) -> Result<&dyn DebridStrategy, DebridError> {
        let adapter = self
            .adapter
            .as_deref()
            .ok_or_else(|| DebridError::InvalidConfiguration {
                reason: "No client provided".to_string(),
            })?;
        if self.token.is_none() {
            return Err(DebridError::InvalidConfiguration {
                reason: "No token provided".to_string(),
            });
        }
        Ok(adapter)
    }

    /// See [`DebridStrategy::cached_files`].
    ///
    /// # Errors
    /// - `DebridError::InvalidConfiguration` - No provider or token set
    /// - plus every error of the selected adapter
    pub async fn cached_files(&self, magnet: &str) -> Result<Vec<File>, DebridError> {
        self.adapter()?.cached_files(magnet).await
    }

    /// See [`DebridStrategy::is_file_cached`].
    ///
    /// # Errors
    /// - `DebridError::InvalidConfiguration` - No provider or token set
    /// - plus every error of the selected adapter
    pub async fn is_file_cached(&self, magnet: &str, path: &str) -> Result<bool, DebridError> {
        self.adapter()?.is_file_cached(magnet, path).await
    }

    /// See [`DebridStrategy::download_link`].
    ///
    /// # Errors
    /// - `DebridError::InvalidConfiguration` - No provider or token set
    /// - plus every error of the selected adapter
    pub async fn download_link(&self, magnet: &str, path: &str) -> Result<String, DebridError> {
        self.adapter()?.download_link(magnet, path).await
    }

    /// See [`DebridStrategy::add_magnet`].
    ///
    /// # Errors
    /// - `DebridError::InvalidConfiguration` - No provider or token set
    /// - plus every error of the selected adapter
    pub async fn add_magnet(&self, magnet: &str) -> Result<String, DebridError> {
        self.adapter()?.add_magnet(magnet).await
    }
}
