//! Debrid-Link adapter.
//!
//! Cache status comes from `seedbox/cached`. Download URLs only exist on
//! seedbox torrents, so resolving a link reuses or adds one and reads the
//! file's `downloadUrl` once the torrent reports full progress.

mod mapper;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use self::mapper::DlTorrent;
use crate::cache::FileCache;
use crate::config::DebridConfig;
use crate::errors::{DebridError, TransportError};
use crate::magnet::{InfoHash, MagnetHandle};
use crate::providers::missing_field;
use crate::strategy::DebridStrategy;
use crate::transport::{
    AuthPlacement, HttpClient, ReqwestClient, RequestOptions, Transport, TransportProfile,
};
use crate::types::{File, ItemStatus, Provider, normalize_path};

pub const BASE_URL: &str = "https://debrid-link.com/api/v2/";

/// Debrid-Link client.
#[derive(Debug)]
pub struct DebridLinkClient {
    transport: Transport,
    cache: FileCache,
}

impl DebridLinkClient {
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
            provider: Provider::DebridLink,
            base_url: BASE_URL,
            auth: AuthPlacement::BearerHeader,
            check: check_response,
        };

        Ok(Self {
            transport: Transport::new(profile, client, config)?,
            cache: FileCache::new(),
        })
    }

    async fn value(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Value, DebridError> {
        let mut envelope = self.transport.request(method, path, options).await?;
        Ok(envelope
            .get_mut("value")
            .map(Value::take)
            .unwrap_or(Value::Null))
    }

    async fn checked_files(&self, magnet: &MagnetHandle) -> Result<Vec<File>, DebridError> {
        let info_hash = magnet.info_hash();
        if let Some(files) = self.cache.get(&info_hash) {
            return Ok(files);
        }

        let value = self
            .value(
                Method::GET,
                "seedbox/cached",
                RequestOptions::new().query("url", magnet.hash_hex()),
            )
            .await?;

        let files = mapper::map_cached(&value, &info_hash);
        if !files.is_empty() {
            self.cache.insert(info_hash, files.clone());
        }
        Ok(files)
    }

    async fn find_torrent(&self, info_hash: &InfoHash) -> Result<Option<DlTorrent>, DebridError> {
        let value = self
            .value(Method::GET, "seedbox/list", RequestOptions::new())
            .await?;

        Ok(mapper::map_torrents(&value)
            .into_iter()
            .find(|torrent| info_hash.matches(&torrent.hash)))
    }

    async fn add_torrent(&self, magnet: &MagnetHandle) -> Result<String, DebridError> {
        let value = self
            .value(
                Method::POST,
                "seedbox/add",
                RequestOptions::new()
                    .form("url", magnet.uri())
                    .form("async", true),
            )
            .await?;

        let id = mapper::map_torrents(&value)
            .into_iter()
            .next()
            .map(|torrent| torrent.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| missing_field(Provider::DebridLink, "seedbox id"))?;

        tracing::info!("Registered {} with Debrid-Link as {}", magnet, id);
        Ok(id)
    }

    async fn torrent_id(&self, magnet: &MagnetHandle) -> Result<String, DebridError> {
        match self.find_torrent(&magnet.info_hash()).await? {
            Some(existing) => {
                tracing::debug!("Debrid-Link already tracks {} as {}", magnet, existing.id);
                Ok(existing.id)
            }
            None => self.add_torrent(magnet).await,
        }
    }

    async fn torrent(&self, id: &str) -> Result<DlTorrent, DebridError> {
        let value = self
            .value(
                Method::GET,
                "seedbox/list",
                RequestOptions::new().query("ids", id),
            )
            .await?;

        mapper::map_torrents(&value)
            .into_iter()
            .find(|torrent| torrent.id == id)
            .ok_or_else(|| missing_field(Provider::DebridLink, "seedbox details"))
    }
}

#[async_trait]
impl DebridStrategy for DebridLinkClient {
    fn provider(&self) -> Provider {
        Provider::DebridLink
    }

    fn set_token(&self, token: &str) -> Result<(), DebridError> {
        self.transport.set_token(token)
    }

    async fn cached_files(&self, magnet: &str) -> Result<Vec<File>, DebridError> {
        let magnet = MagnetHandle::parse(magnet)?;
        self.checked_files(&magnet).await
    }

    async fn download_link(&self, magnet: &str, path: &str) -> Result<String, DebridError> {
        let magnet = MagnetHandle::parse(magnet)?;
        let info_hash = magnet.info_hash();

        let wanted = normalize_path(path);
        let cached = self.checked_files(&magnet).await?;
        if cached.is_empty() {
            return Err(DebridError::NotCached { info_hash });
        }
        if !cached.iter().any(|file| file.path == wanted) {
            return Err(DebridError::FileNotFound {
                info_hash,
                path: path.to_string(),
            });
        }

        let id = self.torrent_id(&magnet).await?;
        let item = mapper::map_item(&self.torrent(&id).await?);
        if item.status == ItemStatus::Pending {
            return Err(DebridError::NotReady {
                id: item.id,
                status: item.raw_status,
            });
        }

        // A listed file can still be absent from the seedbox record
        item.find_file(path)
            .and_then(|file| file.data_str("downloadUrl"))
            .map(str::to_string)
            .ok_or_else(|| DebridError::LinkUnavailable {
                path: path.to_string(),
            })
    }

    async fn add_magnet(&self, magnet: &str) -> Result<String, DebridError> {
        let magnet = MagnetHandle::parse(magnet)?;
        let id = self.torrent_id(&magnet).await?;
        self.cache.invalidate(&magnet.info_hash());
        Ok(id)
    }
}

/// Debrid-Link wraps bodies in `{success, error, value}`.
fn check_response(value: &Value) -> Result<(), DebridError> {
    match value.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(()),
        Some(false) => {
            let code = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error");
            let message = value
                .get("error_description")
                .and_then(Value::as_str)
                .unwrap_or(code);
            Err(DebridError::provider(
                Provider::DebridLink,
                code,
                message,
                mapper::classify_error(code),
            ))
        }
        None => Err(TransportError::Decode {
            reason: "Invalid response format: missing success field".to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::errors::ErrorCategory;
    use crate::test_mocks::MockHttpClient;

    const HASH: &str = "34ff1fae9661d72152fb1fc31e27c15297072654";

    fn magnet() -> String {
        format!("magnet:?xt=urn:btih:{HASH}&dn=Movie")
    }

    fn client(mock: &Arc<MockHttpClient>) -> DebridLinkClient {
        let client =
            DebridLinkClient::with_http_client(mock.clone(), &DebridConfig::for_testing()).unwrap();
        client.set_token("dl-token").unwrap();
        client
    }

    fn cached() -> Value {
        let mut value = serde_json::Map::new();
        value.insert(
            HASH.to_string(),
            json!({"name": "Movie", "files": [{"name": "movie.mp4", "size": 1572864}]}),
        );
        json!({"success": true, "value": value})
    }

    fn seedbox(percent: u64) -> Value {
        json!({"success": true, "value": [{
            "id": "dl-1",
            "name": "Movie",
            "hashString": HASH,
            "downloadPercent": percent,
            "files": [{
                "id": "dl-1-000",
                "name": "movie.mp4",
                "size": 1572864,
                "downloadUrl": "https://dl.debrid-link.com/dl/movie.mp4"
            }]
        }]})
    }

    #[tokio::test]
    async fn test_cached_files_memoized() {
        let mock = MockHttpClient::new();
        mock.push_json(200, cached());
        let client = client(&mock);

        let files = client.cached_files(&magnet()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "movie.mp4");
        assert_eq!(client.cached_files(&magnet()).await.unwrap(), files);
        assert_eq!(mock.request_count(), 1);
        assert_eq!(mock.last_request().unwrap().query_value("url"), Some(HASH));
    }

    #[tokio::test]
    async fn test_download_link_reuses_seedbox_entry() {
        let mock = MockHttpClient::new();
        mock.push_json(200, cached());
        mock.push_json(200, seedbox(100));
        mock.push_json(200, seedbox(100));
        let client = client(&mock);

        let link = client.download_link(&magnet(), "movie.mp4").await.unwrap();
        assert_eq!(link, "https://dl.debrid-link.com/dl/movie.mp4");
        assert_eq!(mock.last_request().unwrap().query_value("ids"), Some("dl-1"));
    }

    #[tokio::test]
    async fn test_download_link_adds_and_reports_progress() {
        let mock = MockHttpClient::new();
        mock.push_json(200, cached());
        mock.push_json(200, json!({"success": true, "value": []}));
        mock.push_json(200, json!({"success": true, "value": {"id": "dl-1", "hashString": HASH}}));
        mock.push_json(200, seedbox(35));
        let client = client(&mock);

        let result = client.download_link(&magnet(), "movie.mp4").await;
        assert!(matches!(result, Err(DebridError::NotReady { ref status, .. }) if status == "35%"));

        let add = &mock.requests()[2];
        assert_eq!(add.path(), "/api/v2/seedbox/add");
        assert_eq!(add.form_value("url"), Some(magnet().as_str()));
        assert_eq!(add.form_value("async"), Some("true"));
    }

    #[tokio::test]
    async fn test_download_link_listed_file_missing_from_seedbox_is_unavailable() {
        let mock = MockHttpClient::new();
        mock.push_json(200, cached());
        mock.push_json(200, seedbox(100));
        let mut record = seedbox(100);
        record["value"][0]["files"] = json!([]);
        mock.push_json(200, record);
        let client = client(&mock);

        let result = client.download_link(&magnet(), "movie.mp4").await;
        assert!(matches!(result, Err(DebridError::LinkUnavailable { ref path }) if path == "movie.mp4"));
    }

    #[tokio::test]
    async fn test_download_link_unlisted_path_is_not_found() {
        let mock = MockHttpClient::new();
        mock.push_json(200, cached());
        let client = client(&mock);

        assert!(matches!(
            client.download_link(&magnet(), "other.mkv").await,
            Err(DebridError::FileNotFound { .. })
        ));
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_download_link_not_ready_then_ready() {
        let mock = MockHttpClient::new();
        mock.push_json(200, cached());
        mock.push_json(200, seedbox(60));
        mock.push_json(200, seedbox(60));
        mock.push_json(200, seedbox(100));
        mock.push_json(200, seedbox(100));
        let client = client(&mock);

        assert!(matches!(
            client.download_link(&magnet(), "movie.mp4").await,
            Err(DebridError::NotReady { .. })
        ));
        let link = client.download_link(&magnet(), "movie.mp4").await.unwrap();
        assert_eq!(link, "https://dl.debrid-link.com/dl/movie.mp4");
        assert_eq!(mock.request_count(), 5);
    }

    #[tokio::test]
    async fn test_download_link_not_cached() {
        let mock = MockHttpClient::new();
        mock.push_json(200, json!({"success": true, "value": {}}));
        let client = client(&mock);

        assert!(matches!(
            client.download_link(&magnet(), "movie.mp4").await,
            Err(DebridError::NotCached { .. })
        ));
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_add_magnet_idempotent() {
        let mock = MockHttpClient::new();
        mock.push_json(200, json!({"success": true, "value": []}));
        mock.push_json(200, json!({"success": true, "value": {"id": "dl-9", "hashString": HASH}}));
        mock.push_json(
            200,
            json!({"success": true, "value": [{"id": "dl-9", "hashString": HASH, "downloadPercent": 3}]}),
        );
        let client = client(&mock);

        let first = client.add_magnet(&magnet()).await.unwrap();
        assert_eq!(first, "dl-9");
        let second = client.add_magnet(&magnet()).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(mock.request_count(), 3);
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let mock = MockHttpClient::new();
        mock.push_json(401, json!({"success": false, "error": "badToken"}));
        let client = client(&mock);

        let error = client.cached_files(&magnet()).await.unwrap_err();
        assert!(matches!(
            error,
            DebridError::Provider {
                category: ErrorCategory::Authentication,
                ..
            }
        ));
    }
}
