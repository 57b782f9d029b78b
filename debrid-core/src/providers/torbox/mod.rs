//! TorBox adapter.
//!
//! Instant availability comes from `checkcached`. Links require a torrent on
//! the account: an existing `mylist` entry is reused, otherwise one is
//! created with `add_only_if_cached` so resolving a link never starts a real
//! download. `requestdl` takes the token as a query parameter.

mod mapper;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use self::mapper::{TbCreated, TbTorrent};
use crate::cache::FileCache;
use crate::config::DebridConfig;
use crate::errors::{DebridError, ErrorCategory, TransportError};
use crate::magnet::{InfoHash, MagnetHandle};
use crate::providers::missing_field;
use crate::strategy::DebridStrategy;
use crate::transport::{
    AuthPlacement, HttpClient, ReqwestClient, RequestOptions, Transport, TransportProfile,
    decode_value,
};
use crate::types::{File, ItemStatus, Provider};

pub const BASE_URL: &str = "https://api.torbox.app";

const CHECK_CACHED_PATH: &str = "/v1/api/torrents/checkcached";
const MYLIST_PATH: &str = "/v1/api/torrents/mylist";
const CREATE_PATH: &str = "/v1/api/torrents/createtorrent";
const REQUEST_DL_PATH: &str = "/v1/api/torrents/requestdl";

/// TorBox client.
#[derive(Debug)]
pub struct TorBoxClient {
    transport: Transport,
    cache: FileCache,
}

impl TorBoxClient {
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
            provider: Provider::TorBox,
            base_url: BASE_URL,
            auth: AuthPlacement::BearerHeader,
            check: check_response,
        };

        Ok(Self {
            transport: Transport::new(profile, client, config)?,
            cache: FileCache::new(),
        })
    }

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

    async fn checked_files(&self, magnet: &MagnetHandle) -> Result<Vec<File>, DebridError> {
        let info_hash = magnet.info_hash();
        if let Some(files) = self.cache.get(&info_hash) {
            return Ok(files);
        }

        let data = self
            .data(
                Method::GET,
                CHECK_CACHED_PATH,
                RequestOptions::new()
                    .query("hash", magnet.hash_hex())
                    .query("format", "list")
                    .query("list_files", true),
            )
            .await?;

        let Some(cached) = mapper::find_cached(&data, &info_hash) else {
            return Ok(Vec::new());
        };

        let files = mapper::map_files(&cached.files);
        if !files.is_empty() {
            self.cache.insert(info_hash, files.clone());
        }
        Ok(files)
    }

    async fn find_torrent(&self, info_hash: &InfoHash) -> Result<Option<TbTorrent>, DebridError> {
        let data = self
            .data(
                Method::GET,
                MYLIST_PATH,
                RequestOptions::new().query("bypass_cache", true),
            )
            .await?;

        Ok(mapper::map_torrents(&data)
            .into_iter()
            .find(|torrent| info_hash.matches(&torrent.hash)))
    }

    async fn torrent(&self, id: &str) -> Result<TbTorrent, DebridError> {
        let data = self
            .data(
                Method::GET,
                MYLIST_PATH,
                RequestOptions::new()
                    .query("id", id)
                    .query("bypass_cache", true),
            )
            .await?;

        mapper::map_torrents(&data)
            .into_iter()
            .next()
            .ok_or_else(|| missing_field(Provider::TorBox, "torrent details"))
    }

    async fn create_torrent(
        &self,
        magnet: &MagnetHandle,
        only_if_cached: bool,
    ) -> Result<String, DebridError> {
        let data = self
            .data(
                Method::POST,
                CREATE_PATH,
                RequestOptions::new()
                    .form("magnet", magnet.uri())
                    .form("allow_zip", false)
                    .form("add_only_if_cached", only_if_cached),
            )
            .await?;
        let created: TbCreated = decode_value(data)?;

        if created.torrent_id.is_empty() {
            return Err(missing_field(Provider::TorBox, "torrent_id"));
        }
        tracing::info!("Registered {} with TorBox as {}", magnet, created.torrent_id);
        Ok(created.torrent_id)
    }

    async fn torrent_id(
        &self,
        magnet: &MagnetHandle,
        only_if_cached: bool,
    ) -> Result<String, DebridError> {
        match self.find_torrent(&magnet.info_hash()).await? {
            Some(existing) => {
                tracing::debug!("TorBox already tracks {} as {}", magnet, existing.id);
                Ok(existing.id)
            }
            None => self.create_torrent(magnet, only_if_cached).await,
        }
    }
}

#[async_trait]
impl DebridStrategy for TorBoxClient {
    fn provider(&self) -> Provider {
        Provider::TorBox
    }

    fn set_token(&self, token: &str) -> Result<(), DebridError> {
        self.transport.set_token(token)
    }

    async fn cached_files(&self, magnet: &str) -> Result<Vec<File>, DebridError> {
        let magnet = MagnetHandle::parse(magnet)?;
        self.checked_files(&magnet).await
    }

    async fn is_file_cached(&self, magnet: &str, path: &str) -> Result<bool, DebridError> {
        let magnet = MagnetHandle::parse(magnet)?;
        let wanted = mapper::request_path(path);
        let files = self.checked_files(&magnet).await?;
        Ok(files.iter().any(|file| file.path == wanted))
    }

    async fn download_link(&self, magnet: &str, path: &str) -> Result<String, DebridError> {
        let magnet = MagnetHandle::parse(magnet)?;
        let info_hash = magnet.info_hash();
        let wanted = mapper::request_path(path);

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

        let id = self.torrent_id(&magnet, true).await?;
        let torrent = self.torrent(&id).await?;
        let item = mapper::map_item(&torrent);
        match item.status {
            ItemStatus::Ready => {}
            ItemStatus::Pending => {
                return Err(DebridError::NotReady {
                    id: item.id,
                    status: item.raw_status,
                });
            }
            ItemStatus::Error => {
                return Err(DebridError::provider(
                    Provider::TorBox,
                    item.raw_status.clone(),
                    format!("Torrent {} failed with state: {}", item.id, item.raw_status),
                    ErrorCategory::Other,
                ));
            }
        }

        let file_id = item
            .files
            .iter()
            .find(|file| file.path == wanted)
            .and_then(|file| file.provider_data.get("id"))
            .and_then(|id| match id {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| DebridError::LinkUnavailable {
                path: path.to_string(),
            })?;

        let token = self.transport.token()?;
        let data = self
            .data(
                Method::GET,
                REQUEST_DL_PATH,
                RequestOptions::new()
                    .query("token", token)
                    .query("torrent_id", &item.id)
                    .query("file_id", file_id)
                    .query("zip_link", false)
                    .query("redirect", false),
            )
            .await?;

        match data {
            Value::String(link) if !link.is_empty() => Ok(link),
            _ => Err(DebridError::LinkUnavailable {
                path: path.to_string(),
            }),
        }
    }

    async fn add_magnet(&self, magnet: &str) -> Result<String, DebridError> {
        let magnet = MagnetHandle::parse(magnet)?;
        let id = self.torrent_id(&magnet, false).await?;
        self.cache.invalidate(&magnet.info_hash());
        Ok(id)
    }
}

/// TorBox wraps bodies in `{success, error, detail, data}`.
fn check_response(value: &Value) -> Result<(), DebridError> {
    match value.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(()),
        Some(false) => {
            let code = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("UNKNOWN_ERROR");
            let detail = value
                .get("detail")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            Err(DebridError::provider(
                Provider::TorBox,
                code,
                detail,
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
    use crate::test_mocks::MockHttpClient;

    const HASH: &str = "34ff1fae9661d72152fb1fc31e27c15297072654";

    fn magnet() -> String {
        format!("magnet:?xt=urn:btih:{HASH}&dn=Movie")
    }

    fn client(mock: &Arc<MockHttpClient>) -> TorBoxClient {
        let client =
            TorBoxClient::with_http_client(mock.clone(), &DebridConfig::for_testing()).unwrap();
        client.set_token("tb-token").unwrap();
        client
    }

    fn cached() -> Value {
        json!({"success": true, "detail": "Found cached torrent", "data": [{
            "name": "Movie",
            "hash": HASH,
            "files": [{"name": "Movie/Movie  2024.mkv", "size": 1572864}]
        }]})
    }

    fn details(finished: bool) -> Value {
        json!({"success": true, "data": {
            "id": 77,
            "hash": HASH,
            "name": "Movie",
            "download_state": if finished { "cached" } else { "downloading" },
            "download_finished": finished,
            "download_present": finished,
            "files": [{"id": 3, "name": "Movie/Movie  2024.mkv", "size": 1572864}]
        }})
    }

    #[tokio::test]
    async fn test_cached_files_maps_and_memoizes() {
        let mock = MockHttpClient::new();
        mock.push_json(200, cached());
        let client = client(&mock);

        let files = client.cached_files(&magnet()).await.unwrap();
        assert_eq!(files[0].path, "Movie 2024.mkv");
        client.cached_files(&magnet()).await.unwrap();
        assert!(
            client
                .is_file_cached(&magnet(), "/Movie  2024.mkv")
                .await
                .unwrap()
        );
        assert_eq!(mock.request_count(), 1);

        let request = mock.last_request().unwrap();
        assert_eq!(request.query_value("hash"), Some(HASH));
        assert_eq!(request.query_value("format"), Some("list"));
        assert_eq!(request.header("authorization"), Some("Bearer tb-token"));
    }

    #[tokio::test]
    async fn test_cached_files_not_cached_is_empty() {
        let mock = MockHttpClient::new();
        mock.push_json(200, json!({"success": true, "detail": "Not cached", "data": []}));
        let client = client(&mock);

        assert!(client.cached_files(&magnet()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_link_full_protocol() {
        let mock = MockHttpClient::new();
        mock.push_json(200, cached());
        mock.push_json(200, json!({"success": true, "data": []}));
        mock.push_json(200, json!({"success": true, "data": {"torrent_id": 77, "hash": HASH}}));
        mock.push_json(200, details(true));
        mock.push_json(200, json!({"success": true, "data": "https://store.torbox.app/dl/3"}));
        let client = client(&mock);

        let link = client
            .download_link(&magnet(), "Movie   2024.mkv")
            .await
            .unwrap();
        assert_eq!(link, "https://store.torbox.app/dl/3");

        let requests = mock.requests();
        assert_eq!(requests[2].path(), CREATE_PATH);
        assert_eq!(requests[2].form_value("add_only_if_cached"), Some("true"));
        assert_eq!(requests[3].query_value("id"), Some("77"));
        assert_eq!(requests[3].query_value("bypass_cache"), Some("true"));

        let dl = &requests[4];
        assert_eq!(dl.query_value("token"), Some("tb-token"));
        assert_eq!(dl.query_value("torrent_id"), Some("77"));
        assert_eq!(dl.query_value("file_id"), Some("3"));
        assert_eq!(dl.query_value("redirect"), Some("false"));
    }

    #[tokio::test]
    async fn test_download_link_reuses_existing_and_reports_not_ready() {
        let mock = MockHttpClient::new();
        mock.push_json(200, cached());
        mock.push_json(200, json!({"success": true, "data": [{"id": 77, "hash": HASH}]}));
        mock.push_json(200, details(false));
        let client = client(&mock);

        let result = client.download_link(&magnet(), "Movie 2024.mkv").await;
        assert!(matches!(result, Err(DebridError::NotReady { ref id, .. }) if id == "77"));
        assert!(!mock.paths().iter().any(|path| path == CREATE_PATH));
    }

    #[tokio::test]
    async fn test_download_link_listed_file_without_remote_id_is_unavailable() {
        let mock = MockHttpClient::new();
        mock.push_json(200, cached());
        mock.push_json(200, json!({"success": true, "data": [{"id": 77, "hash": HASH}]}));
        let mut record = details(true);
        record["data"]["files"] = json!([{"name": "Movie/Movie  2024.mkv", "size": 1572864}]);
        mock.push_json(200, record);
        let client = client(&mock);

        let result = client.download_link(&magnet(), "Movie 2024.mkv").await;
        assert!(matches!(result, Err(DebridError::LinkUnavailable { ref path }) if path == "Movie 2024.mkv"));

        mock.push_json(200, json!({"success": true, "data": [{"id": 77, "hash": HASH}]}));
        let mut record = details(true);
        record["data"]["files"] = json!([]);
        mock.push_json(200, record);
        assert!(matches!(
            client.download_link(&magnet(), "Movie 2024.mkv").await,
            Err(DebridError::LinkUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_download_link_not_ready_then_ready() {
        let mock = MockHttpClient::new();
        mock.push_json(200, cached());
        mock.push_json(200, json!({"success": true, "data": [{"id": 77, "hash": HASH}]}));
        mock.push_json(200, details(false));
        mock.push_json(200, json!({"success": true, "data": [{"id": 77, "hash": HASH}]}));
        mock.push_json(200, details(true));
        mock.push_json(200, json!({"success": true, "data": "https://store.torbox.app/dl/3"}));
        let client = client(&mock);

        assert!(matches!(
            client.download_link(&magnet(), "Movie 2024.mkv").await,
            Err(DebridError::NotReady { .. })
        ));
        let link = client
            .download_link(&magnet(), "Movie 2024.mkv")
            .await
            .unwrap();
        assert_eq!(link, "https://store.torbox.app/dl/3");
        assert_eq!(mock.request_count(), 6);
    }

    #[tokio::test]
    async fn test_mylist_lookup_bypasses_provider_cache() {
        let mock = MockHttpClient::new();
        mock.push_json(200, json!({"success": true, "data": [{"id": 88, "hash": HASH}]}));
        let client = client(&mock);

        assert_eq!(client.add_magnet(&magnet()).await.unwrap(), "88");
        let request = mock.last_request().unwrap();
        assert_eq!(request.path(), MYLIST_PATH);
        assert_eq!(request.query_value("bypass_cache"), Some("true"));
    }

    #[tokio::test]
    async fn test_download_link_uncached_and_missing_file() {
        let mock = MockHttpClient::new();
        mock.push_json(200, json!({"success": true, "data": []}));
        let client = client(&mock);
        assert!(matches!(
            client.download_link(&magnet(), "a.mkv").await,
            Err(DebridError::NotCached { .. })
        ));

        mock.push_json(200, cached());
        assert!(matches!(
            client.download_link(&magnet(), "other.mkv").await,
            Err(DebridError::FileNotFound { .. })
        ));
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_add_magnet_creates_without_cache_requirement() {
        let mock = MockHttpClient::new();
        mock.push_json(200, json!({"success": true, "data": []}));
        mock.push_json(200, json!({"success": true, "data": {"torrent_id": 88}}));
        mock.push_json(200, json!({"success": true, "data": [{"id": 88, "hash": HASH}]}));
        let client = client(&mock);

        assert_eq!(client.add_magnet(&magnet()).await.unwrap(), "88");
        assert_eq!(
            mock.last_request().unwrap().form_value("add_only_if_cached"),
            Some("false")
        );
        assert_eq!(client.add_magnet(&magnet()).await.unwrap(), "88");
        assert_eq!(mock.request_count(), 3);
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let mock = MockHttpClient::new();
        mock.push_json(
            403,
            json!({"success": false, "error": "BAD_TOKEN", "detail": "Invalid API token", "data": null}),
        );
        let client = client(&mock);

        let error = client.cached_files(&magnet()).await.unwrap_err();
        assert!(matches!(
            error,
            DebridError::Provider {
                category: ErrorCategory::Authentication,
                ref code,
                ..
            } if code == "BAD_TOKEN"
        ));
    }
}
