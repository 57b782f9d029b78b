//! AllDebrid adapter.
//!
//! Authentication travels as the `apikey` query parameter next to the
//! `agent` name. Every response is wrapped in a `{status, data, error}`
//! envelope. A magnet is cached once its status record reports
//! `statusCode` 4.

mod mapper;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use self::mapper::{AdMagnet, AdUnlocked, AdUploaded};
use crate::config::DebridConfig;
use crate::errors::{DebridError, ErrorCategory, TransportError};
use crate::magnet::{InfoHash, MagnetHandle};
use crate::providers::{decode_records, missing_field};
use crate::strategy::DebridStrategy;
use crate::transport::{
    AuthPlacement, HttpClient, ReqwestClient, RequestOptions, Transport, TransportProfile,
    decode_value,
};
use crate::types::{File, ItemStatus, Provider, RemoteItem};

pub const BASE_URL: &str = "https://api.alldebrid.com";

const STATUS_PATH: &str = "/v4.1/magnet/status";

/// AllDebrid client.
#[derive(Debug)]
pub struct AllDebridClient {
    transport: Transport,
    agent: String,
}

impl AllDebridClient {
    /// Creates client with a production HTTP client.
    ///
    /// # Errors
    /// - `DebridError::Transport` - HTTP client cannot be built
    pub fn new(config: &DebridConfig) -> Result<Self, DebridError> {
        let client: Arc<dyn HttpClient> = Arc::new(ReqwestClient::new(&config.http)?);
        Self::with_http_client(client, config)
    }

    /// Creates client over a caller-supplied HTTP client.
    ///
    /// # Errors
    /// - `DebridError::InvalidConfiguration` - Base URL cannot be parsed
    pub fn with_http_client(
        client: Arc<dyn HttpClient>,
        config: &DebridConfig,
    ) -> Result<Self, DebridError> {
        let profile = TransportProfile {
            provider: Provider::AllDebrid,
            base_url: BASE_URL,
            auth: AuthPlacement::QueryParam("apikey"),
            check: check_response,
        };

        Ok(Self {
            transport: Transport::new(profile, client, config)?,
            agent: config.http.agent_name.to_string(),
        })
    }

    fn options(&self) -> RequestOptions {
        RequestOptions::new().query("agent", &self.agent)
    }

    /// Issues a request and returns the envelope's `data` member.
    async fn data(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Value, DebridError> {
        let mut envelope = self.transport.request(method, path, options).await?;
        Ok(envelope
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    async fn find_magnet(&self, info_hash: &InfoHash) -> Result<Option<AdMagnet>, DebridError> {
        let data = self.data(Method::GET, STATUS_PATH, self.options()).await?;

        Ok(mapper::map_magnet_list(&data)
            .into_iter()
            .find(|magnet| info_hash.matches(&magnet.hash)))
    }

    async fn magnet_status(&self, id: &str) -> Result<RemoteItem, DebridError> {
        let data = self
            .data(Method::GET, STATUS_PATH, self.options().query("id", id))
            .await?;

        let magnet = mapper::map_single_magnet(&data)
            .ok_or_else(|| missing_field(Provider::AllDebrid, "magnet status"))?;
        Ok(mapper::map_item(&magnet))
    }

    async fn unlock(&self, link: &str, path: &str) -> Result<String, DebridError> {
        let data = self
            .data(Method::POST, "/v4/link/unlock", self.options().form("link", link))
            .await?;
        let unlocked: AdUnlocked = decode_value(data)?;

        if unlocked.link.is_empty() {
            return Err(DebridError::LinkUnavailable {
                path: path.to_string(),
            });
        }
        Ok(unlocked.link)
    }
}

#[async_trait]
impl DebridStrategy for AllDebridClient {
    fn provider(&self) -> Provider {
        Provider::AllDebrid
    }

    fn set_token(&self, token: &str) -> Result<(), DebridError> {
        self.transport.set_token(token)
    }

    async fn cached_files(&self, magnet: &str) -> Result<Vec<File>, DebridError> {
        let magnet = MagnetHandle::parse(magnet)?;

        let Some(existing) = self.find_magnet(&magnet.info_hash()).await? else {
            return Ok(Vec::new());
        };

        let item = self.magnet_status(&existing.id).await?;
        match item.status {
            ItemStatus::Ready => Ok(item.files),
            ItemStatus::Pending => Ok(Vec::new()),
            ItemStatus::Error => Err(failed_item(&item)),
        }
    }

    async fn download_link(&self, magnet: &str, path: &str) -> Result<String, DebridError> {
        let magnet = MagnetHandle::parse(magnet)?;
        let info_hash = magnet.info_hash();

        let existing = self
            .find_magnet(&info_hash)
            .await?
            .ok_or(DebridError::NotCached { info_hash })?;

        let item = self.magnet_status(&existing.id).await?;
        match item.status {
            ItemStatus::Ready => {}
            ItemStatus::Pending => {
                return Err(DebridError::NotReady {
                    id: item.id,
                    status: item.raw_status,
                });
            }
            ItemStatus::Error => return Err(failed_item(&item)),
        }

        let file = item
            .find_file(path)
            .ok_or_else(|| DebridError::FileNotFound {
                info_hash,
                path: path.to_string(),
            })?;
        let link = file
            .data_str("l")
            .ok_or_else(|| DebridError::LinkUnavailable {
                path: path.to_string(),
            })?;

        self.unlock(link, path).await
    }

    async fn add_magnet(&self, magnet: &str) -> Result<String, DebridError> {
        let magnet = MagnetHandle::parse(magnet)?;

        if let Some(existing) = self.find_magnet(&magnet.info_hash()).await? {
            tracing::debug!("AllDebrid already tracks {} as {}", magnet, existing.id);
            return Ok(existing.id);
        }

        let data = self
            .data(
                Method::POST,
                "/v4/magnet/upload",
                self.options().form("magnets[]", magnet.uri()),
            )
            .await?;

        let uploaded: Vec<AdUploaded> = match data.get("magnets") {
            Some(Value::Array(magnets)) => decode_records(magnets),
            _ => Vec::new(),
        };
        let first = uploaded
            .into_iter()
            .next()
            .ok_or_else(|| missing_field(Provider::AllDebrid, "magnet id"))?;

        if !first.error.is_empty() {
            return Err(envelope_error(&first.error));
        }
        if first.id.is_empty() {
            return Err(missing_field(Provider::AllDebrid, "magnet id"));
        }

        tracing::info!("Registered {} with AllDebrid as {}", magnet, first.id);
        Ok(first.id)
    }
}

fn failed_item(item: &RemoteItem) -> DebridError {
    DebridError::provider(
        Provider::AllDebrid,
        item.raw_status.clone(),
        format!("Magnet {} failed with status: {}", item.id, item.raw_status),
        ErrorCategory::Other,
    )
}

fn envelope_error(error: &serde_json::Map<String, Value>) -> DebridError {
    let code = error
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or("UNKNOWN");
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error");

    DebridError::provider(
        Provider::AllDebrid,
        code,
        message,
        mapper::classify_error(code),
    )
}

/// AllDebrid wraps every body in `{status: "success"|"error", ...}`.
fn check_response(value: &Value) -> Result<(), DebridError> {
    let Some(status) = value.get("status") else {
        return Err(TransportError::Decode {
            reason: "Invalid response format: missing status field".to_string(),
        }
        .into());
    };

    if status.as_str() != Some("error") {
        return Ok(());
    }

    let error = value
        .get("error")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    Err(envelope_error(&error))
}
