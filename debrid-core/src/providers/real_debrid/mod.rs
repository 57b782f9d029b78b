//! Real-Debrid adapter.
//!
//! Real-Debrid has no usable instant-availability query, so cache status is
//! read from the account's torrent list: a magnet counts as cached once its
//! torrent reached `downloaded`. Links are hoster links that must be
//! unrestricted before download.

mod mapper;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use self::mapper::{RdAddedTorrent, RdStatus, RdTorrent, RdTorrentInfo, RdUnrestricted};
use crate::config::DebridConfig;
use crate::errors::{DebridError, ErrorCategory};
use crate::magnet::{InfoHash, MagnetHandle};
use crate::providers::missing_field;
use crate::strategy::DebridStrategy;
use crate::transport::{
    AuthPlacement, HttpClient, ReqwestClient, RequestOptions, Transport, TransportProfile,
    decode_value,
};
use crate::types::{File, ItemStatus, Provider, RemoteItem};

pub const BASE_URL: &str = "https://api.real-debrid.com/rest/1.0/";

/// Page size for `GET torrents`; the API caps it at 5000.
const LIST_LIMIT: u32 = 5000;

/// Real-Debrid client.
#[derive(Debug)]
pub struct RealDebridClient {
    transport: Transport,
}

impl RealDebridClient {
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
        Ok(Self {
            transport: Transport::new(Self::profile(), client, config)?,
        })
    }

    fn profile() -> TransportProfile {
        TransportProfile {
            provider: Provider::RealDebrid,
            base_url: BASE_URL,
            auth: AuthPlacement::BearerHeader,
            check: check_response,
        }
    }

    /// Walks the account's torrent pages until the hash matches or a short
    /// page ends the listing.
    async fn find_torrent(&self, info_hash: &InfoHash) -> Result<Option<RdTorrent>, DebridError> {
        let mut page = 1u32;
        loop {
            let listing: Vec<Value> = self
                .transport
                .request_as(
                    Method::GET,
                    "torrents",
                    RequestOptions::new()
                        .query("page", page)
                        .query("limit", LIST_LIMIT),
                )
                .await?;

            let page_len = listing.len();
            if let Some(torrent) = mapper::map_torrent_list(&listing)
                .into_iter()
                .find(|torrent| info_hash.matches(&torrent.hash))
            {
                return Ok(Some(torrent));
            }
            if page_len < LIST_LIMIT as usize {
                return Ok(None);
            }
            page += 1;
        }
    }

    async fn torrent_info(&self, id: &str) -> Result<RemoteItem, DebridError> {
        let value = self
            .transport
            .request(
                Method::GET,
                &format!("torrents/info/{id}"),
                RequestOptions::new(),
            )
            .await?;
        let info: RdTorrentInfo = decode_value(value)?;
        Ok(mapper::map_item(&info))
    }

    async fn unrestrict(&self, link: &str, path: &str) -> Result<String, DebridError> {
        let unrestricted: RdUnrestricted = self
            .transport
            .request_as(
                Method::POST,
                "unrestrict/link",
                RequestOptions::new().form("link", link),
            )
            .await?;

        if unrestricted.download.is_empty() {
            return Err(DebridError::LinkUnavailable {
                path: path.to_string(),
            });
        }
        Ok(unrestricted.download)
    }
}

#[async_trait]
impl DebridStrategy for RealDebridClient {
    fn provider(&self) -> Provider {
        Provider::RealDebrid
    }

    fn set_token(&self, token: &str) -> Result<(), DebridError> {
        self.transport.set_token(token)
    }

    async fn cached_files(&self, magnet: &str) -> Result<Vec<File>, DebridError> {
        let magnet = MagnetHandle::parse(magnet)?;

        let Some(torrent) = self.find_torrent(&magnet.info_hash()).await? else {
            return Ok(Vec::new());
        };

        match RdStatus::parse(&torrent.status).classify() {
            ItemStatus::Pending => {
                tracing::debug!(
                    "Real-Debrid torrent {} still {}, not cached yet",
                    torrent.id,
                    torrent.status
                );
                Ok(Vec::new())
            }
            ItemStatus::Error => Err(failed_item(&torrent.id, &torrent.status)),
            ItemStatus::Ready => {
                let item = self.torrent_info(&torrent.id).await?;
                match item.status {
                    ItemStatus::Ready => Ok(item.files),
                    ItemStatus::Pending => Ok(Vec::new()),
                    ItemStatus::Error => Err(failed_item(&item.id, &item.raw_status)),
                }
            }
        }
    }

    async fn download_link(&self, magnet: &str, path: &str) -> Result<String, DebridError> {
        let magnet = MagnetHandle::parse(magnet)?;
        let info_hash = magnet.info_hash();

        let torrent = self
            .find_torrent(&info_hash)
            .await?
            .ok_or(DebridError::NotCached { info_hash })?;

        let item = self.torrent_info(&torrent.id).await?;
        match item.status {
            ItemStatus::Ready => {}
            ItemStatus::Pending => {
                return Err(DebridError::NotReady {
                    id: item.id,
                    status: item.raw_status,
                });
            }
            ItemStatus::Error => return Err(failed_item(&item.id, &item.raw_status)),
        }

        let file = item
            .find_file(path)
            .ok_or_else(|| DebridError::FileNotFound {
                info_hash,
                path: path.to_string(),
            })?;

        let link = file
            .data_str("link")
            .ok_or_else(|| DebridError::LinkUnavailable {
                path: path.to_string(),
            })?;

        self.unrestrict(link, path).await
    }

    async fn add_magnet(&self, magnet: &str) -> Result<String, DebridError> {
        let magnet = MagnetHandle::parse(magnet)?;

        if let Some(existing) = self.find_torrent(&magnet.info_hash()).await? {
            tracing::debug!(
                "Real-Debrid already tracks {} as {}",
                magnet,
                existing.id
            );
            return Ok(existing.id);
        }

        let added: RdAddedTorrent = self
            .transport
            .request_as(
                Method::POST,
                "torrents/addMagnet",
                RequestOptions::new().form("magnet", magnet.uri()),
            )
            .await?;

        if added.id.is_empty() {
            return Err(missing_field(Provider::RealDebrid, "torrent id"));
        }

        self.transport
            .request(
                Method::POST,
                &format!("torrents/selectFiles/{}", added.id),
                RequestOptions::new().form("files", "all"),
            )
            .await?;

        tracing::info!("Registered {} with Real-Debrid as {}", magnet, added.id);
        Ok(added.id)
    }
}

fn failed_item(id: &str, status: &str) -> DebridError {
    DebridError::provider(
        Provider::RealDebrid,
        status,
        format!("Torrent {id} failed with status: {status}"),
        ErrorCategory::Other,
    )
}

/// Real-Debrid signals errors as `{"error": "...", "error_code": n}`.
fn check_response(value: &Value) -> Result<(), DebridError> {
    let Some(error) = value.get("error").filter(|error| !error.is_null()) else {
        return Ok(());
    };

    let message = error.as_str().unwrap_or("Unknown error").to_string();
    let code = value.get("error_code").and_then(Value::as_i64);
    let category = mapper::classify_error(code, &message);

    Err(DebridError::provider(
        Provider::RealDebrid,
        code.map_or_else(|| message.clone(), |code| code.to_string()),
        message,
        category,
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::errors::TransportError;
    use crate::test_mocks::MockHttpClient;

    const HASH: &str = "34ff1fae9661d72152fb1fc31e27c15297072654";

    fn magnet() -> String {
        format!("magnet:?xt=urn:btih:{}&dn=Movie", HASH.to_uppercase())
    }

    fn client(mock: &Arc<MockHttpClient>) -> RealDebridClient {
        let client =
            RealDebridClient::with_http_client(mock.clone(), &DebridConfig::for_testing()).unwrap();
        client.set_token("rd-token").unwrap();
        client
    }

    fn listing(status: &str) -> Value {
        json!([
            {"id": "OTHER", "hash": "0000000000000000000000000000000000000000", "status": "downloaded"},
            {"id": "RDID", "filename": "Movie", "hash": HASH, "bytes": 1572864, "status": status}
        ])
    }

    fn info() -> Value {
        json!({
            "id": "RDID",
            "filename": "Movie",
            "hash": HASH,
            "status": "downloaded",
            "files": [{"id": 1, "path": "/movie.mp4", "bytes": 1572864, "selected": 1}],
            "links": ["https://real-debrid.com/d/RESTRICTED"]
        })
    }

    #[tokio::test]
    async fn test_cached_files_unregistered_is_empty() {
        let mock = MockHttpClient::new();
        mock.push_raw(204, "");
        let client = client(&mock);

        let files = client.cached_files(&magnet()).await.unwrap();
        assert!(files.is_empty());
        assert_eq!(mock.paths(), vec!["/rest/1.0/torrents"]);
    }

    #[tokio::test]
    async fn test_pending_polls_until_ready_without_reregistering() {
        let mock = MockHttpClient::new();
        mock.push_json(200, listing("downloading"));
        mock.push_json(200, listing("downloading"));
        mock.push_json(200, listing("downloaded"));
        mock.push_json(200, info());
        let client = client(&mock);

        assert!(client.cached_files(&magnet()).await.unwrap().is_empty());
        assert!(client.cached_files(&magnet()).await.unwrap().is_empty());
        let files = client.cached_files(&magnet()).await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "movie.mp4");
        assert_eq!(files[0].size, 1_572_864);
        assert!(
            mock.requests()
                .iter()
                .all(|request| request.method == Method::GET)
        );
    }

    #[tokio::test]
    async fn test_lookup_pages_through_full_listings() {
        let mock = MockHttpClient::new();
        let filler: Vec<Value> = (0..LIST_LIMIT)
            .map(|i| json!({"id": format!("OLD{i}"), "hash": format!("{i:040x}"), "status": "downloaded"}))
            .collect();
        mock.push_json(200, Value::Array(filler));
        mock.push_json(200, json!([{"id": "RDID", "hash": HASH, "status": "queued"}]));
        let client = client(&mock);

        assert_eq!(client.add_magnet(&magnet()).await.unwrap(), "RDID");
        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].query_value("page"), Some("1"));
        assert_eq!(requests[1].query_value("page"), Some("2"));
        assert_eq!(requests[1].query_value("limit"), Some("5000"));
    }

    #[tokio::test]
    async fn test_cached_files_surfaces_failed_torrent() {
        let mock = MockHttpClient::new();
        mock.push_json(200, listing("dead"));
        let client = client(&mock);

        let result = client.cached_files(&magnet()).await;
        assert!(matches!(
            result,
            Err(DebridError::Provider { ref code, .. }) if code == "dead"
        ));
    }

    #[tokio::test]
    async fn test_download_link_unrestricts() {
        let mock = MockHttpClient::new();
        mock.push_json(200, listing("downloaded"));
        mock.push_json(200, info());
        mock.push_json(
            200,
            json!({"id": "U", "filename": "movie.mp4", "download": "https://download.real-debrid.com/movie.mp4"}),
        );
        let client = client(&mock);

        let link = client.download_link(&magnet(), "movie.mp4").await.unwrap();
        assert_eq!(link, "https://download.real-debrid.com/movie.mp4");

        let unrestrict = mock.last_request().unwrap();
        assert_eq!(unrestrict.path(), "/rest/1.0/unrestrict/link");
        assert_eq!(
            unrestrict.form_value("link"),
            Some("https://real-debrid.com/d/RESTRICTED")
        );
        assert_eq!(unrestrict.header("authorization"), Some("Bearer rd-token"));
    }

    #[tokio::test]
    async fn test_download_link_error_kinds() {
        let mock = MockHttpClient::new();
        mock.push_json(200, json!([]));
        let client = client(&mock);
        assert!(matches!(
            client.download_link(&magnet(), "movie.mp4").await,
            Err(DebridError::NotCached { .. })
        ));

        mock.push_json(200, listing("downloading"));
        mock.push_json(200, json!({"id": "RDID", "status": "downloading"}));
        assert!(matches!(
            client.download_link(&magnet(), "movie.mp4").await,
            Err(DebridError::NotReady { ref status, .. }) if status == "downloading"
        ));

        mock.push_json(200, listing("downloaded"));
        mock.push_json(200, info());
        assert!(matches!(
            client.download_link(&magnet(), "other.mkv").await,
            Err(DebridError::FileNotFound { .. })
        ));

        let mut no_links = info();
        no_links["links"] = json!([]);
        mock.push_json(200, listing("downloaded"));
        mock.push_json(200, no_links);
        assert!(matches!(
            client.download_link(&magnet(), "movie.mp4").await,
            Err(DebridError::LinkUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_add_magnet_registers_and_selects_files() {
        let mock = MockHttpClient::new();
        mock.push_json(200, json!([]));
        mock.push_json(201, json!({"id": "NEWID", "uri": "https://api.real-debrid.com/rest/1.0/torrents/info/NEWID"}));
        mock.push_raw(204, "");
        let client = client(&mock);

        let id = client.add_magnet(&magnet()).await.unwrap();
        assert_eq!(id, "NEWID");

        let requests = mock.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].form_value("magnet"), Some(magnet().as_str()));
        assert_eq!(requests[2].path(), "/rest/1.0/torrents/selectFiles/NEWID");
        assert_eq!(requests[2].form_value("files"), Some("all"));
    }

    #[tokio::test]
    async fn test_add_magnet_reuses_existing_record() {
        let mock = MockHttpClient::new();
        mock.push_json(200, listing("downloading"));
        mock.push_json(200, listing("downloading"));
        let client = client(&mock);

        let first = client.add_magnet(&magnet()).await.unwrap();
        let second = client.add_magnet(&magnet()).await.unwrap();
        assert_eq!(first, "RDID");
        assert_eq!(first, second);
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_add_magnet_without_id_fails() {
        let mock = MockHttpClient::new();
        mock.push_json(200, json!([]));
        mock.push_json(201, json!({"uri": "x"}));
        let client = client(&mock);

        assert!(matches!(
            client.add_magnet(&magnet()).await,
            Err(DebridError::Transport(TransportError::Decode { .. }))
        ));
    }

    #[tokio::test]
    async fn test_bad_token_is_authentication_error() {
        let mock = MockHttpClient::new();
        mock.push_json(401, json!({"error": "bad_token", "error_code": 8}));
        let client = client(&mock);

        let error = client.cached_files(&magnet()).await.unwrap_err();
        assert!(matches!(
            error,
            DebridError::Provider {
                category: ErrorCategory::Authentication,
                ..
            }
        ));
        assert!(error.requires_reauthentication());
    }

    #[tokio::test]
    async fn test_invalid_magnet_makes_no_request() {
        let mock = MockHttpClient::new();
        let client = client(&mock);

        assert!(matches!(
            client.add_magnet("magnet:?dn=nohash").await,
            Err(DebridError::InvalidMagnet { .. })
        ));
        assert_eq!(mock.request_count(), 0);
    }
}
