//! Premiumize adapter.
//!
//! Premiumize answers the cache question directly (`cache/check`) and serves
//! cached content without creating a transfer (`transfer/directdl`), so files
//! and links come from a single listing that is memoized per info-hash.

mod mapper;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use self::mapper::{PmCreated, PmDirectDl};
use crate::cache::FileCache;
use crate::config::DebridConfig;
use crate::errors::DebridError;
use crate::magnet::MagnetHandle;
use crate::providers::missing_field;
use crate::strategy::DebridStrategy;
use crate::transport::{
    AuthPlacement, HttpClient, ReqwestClient, RequestOptions, Transport, TransportProfile,
};
use crate::types::{File, Provider, normalize_path};

pub const BASE_URL: &str = "https://www.premiumize.me/api/";

/// Premiumize client.
#[derive(Debug)]
pub struct PremiumizeClient {
    transport: Transport,
    cache: FileCache,
}

impl PremiumizeClient {
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
            provider: Provider::Premiumize,
            base_url: BASE_URL,
            auth: AuthPlacement::QueryParam("apikey"),
            check: check_response,
        };

        Ok(Self {
            transport: Transport::new(profile, client, config)?,
            cache: FileCache::new(),
        })
    }

    async fn is_cached(&self, magnet: &MagnetHandle) -> Result<bool, DebridError> {
        let body = self
            .transport
            .request(
                Method::GET,
                "cache/check",
                RequestOptions::new().query("items[]", magnet.uri()),
            )
            .await?;
        Ok(mapper::is_cached(&body))
    }

    /// File list of a cached magnet, `None` when the magnet is not cached.
    async fn files(&self, magnet: &MagnetHandle) -> Result<Option<Vec<File>>, DebridError> {
        let info_hash = magnet.info_hash();
        if let Some(files) = self.cache.get(&info_hash) {
            return Ok(Some(files));
        }

        if !self.is_cached(magnet).await? {
            return Ok(None);
        }

        let directdl: PmDirectDl = self
            .transport
            .request_as(
                Method::POST,
                "transfer/directdl",
                RequestOptions::new().form("src", magnet.uri()),
            )
            .await?;

        let files = mapper::map_files(&directdl);
        tracing::debug!("Premiumize lists {} files for {}", files.len(), magnet);
        if !files.is_empty() {
            self.cache.insert(info_hash, files.clone());
        }
        Ok(Some(files))
    }

    async fn find_transfer(&self, magnet: &MagnetHandle) -> Result<Option<String>, DebridError> {
        let body = self
            .transport
            .request(Method::GET, "transfer/list", RequestOptions::new())
            .await?;

        let wanted = magnet.hash_hex();
        Ok(mapper::map_transfers(&body)
            .into_iter()
            .find(|transfer| transfer.hash().as_deref() == Some(wanted.as_str()))
            .map(|transfer| transfer.id))
    }
}

#[async_trait]
impl DebridStrategy for PremiumizeClient {
    fn provider(&self) -> Provider {
        Provider::Premiumize
    }

    fn set_token(&self, token: &str) -> Result<(), DebridError> {
        self.transport.set_token(token)
    }

    async fn cached_files(&self, magnet: &str) -> Result<Vec<File>, DebridError> {
        let magnet = MagnetHandle::parse(magnet)?;
        Ok(self.files(&magnet).await?.unwrap_or_default())
    }

    async fn download_link(&self, magnet: &str, path: &str) -> Result<String, DebridError> {
        let magnet = MagnetHandle::parse(magnet)?;
        let info_hash = magnet.info_hash();

        let files = self
            .files(&magnet)
            .await?
            .ok_or(DebridError::NotCached { info_hash })?;

        let wanted = normalize_path(path);
        let file = files
            .iter()
            .find(|file| file.path == wanted)
            .ok_or_else(|| DebridError::FileNotFound {
                info_hash,
                path: path.to_string(),
            })?;

        mapper::preferred_link(file)
            .map(str::to_string)
            .ok_or_else(|| DebridError::LinkUnavailable {
                path: path.to_string(),
            })
    }

    async fn add_magnet(&self, magnet: &str) -> Result<String, DebridError> {
        let magnet = MagnetHandle::parse(magnet)?;
        self.cache.invalidate(&magnet.info_hash());

        if let Some(id) = self.find_transfer(&magnet).await? {
            tracing::debug!("Premiumize already tracks {} as {}", magnet, id);
            return Ok(id);
        }

        let created: PmCreated = self
            .transport
            .request_as(
                Method::POST,
                "transfer/create",
                RequestOptions::new().form("src", magnet.uri()),
            )
            .await?;

        if created.id.is_empty() {
            return Err(missing_field(Provider::Premiumize, "transfer id"));
        }

        tracing::info!("Registered {} with Premiumize as {}", magnet, created.id);
        Ok(created.id)
    }
}

/// Premiumize signals errors as `{"status": "error", "message": "..."}`.
fn check_response(value: &Value) -> Result<(), DebridError> {
    if value.get("status").and_then(Value::as_str) != Some("error") {
        return Ok(());
    }

    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error");

    Err(DebridError::provider(
        Provider::Premiumize,
        "error",
        message,
        mapper::classify_error(message),
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::errors::ErrorCategory;
    use crate::test_mocks::MockHttpClient;

    const HASH: &str = "34ff1fae9661d72152fb1fc31e27c15297072654";

    fn magnet() -> String {
        format!("magnet:?xt=urn:btih:{HASH}&dn=movie")
    }

    fn client(mock: &Arc<MockHttpClient>) -> PremiumizeClient {
        let client =
            PremiumizeClient::with_http_client(mock.clone(), &DebridConfig::for_testing()).unwrap();
        client.set_token("pm-key").unwrap();
        client
    }

    fn directdl() -> Value {
        json!({"status": "success", "content": [{
            "path": "movie/movie.mp4",
            "size": 1572864,
            "link": "https://pm.example/dl/movie.mp4",
            "stream_link": "https://pm.example/stream/movie.mp4"
        }]})
    }

    #[tokio::test]
    async fn test_cached_files_lists_and_memoizes() {
        let mock = MockHttpClient::new();
        mock.push_json(200, json!({"status": "success", "response": [true]}));
        mock.push_json(200, directdl());
        let client = client(&mock);

        let files = client.cached_files(&magnet()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "movie.mp4");
        assert_eq!(files[0].size, 1_572_864);

        let again = client.cached_files(&magnet()).await.unwrap();
        assert_eq!(again, files);
        assert_eq!(mock.request_count(), 2);

        let check = &mock.requests()[0];
        assert_eq!(check.query_value("items[]"), Some(magnet().as_str()));
        assert_eq!(check.query_value("apikey"), Some("pm-key"));
    }

    #[tokio::test]
    async fn test_empty_directdl_is_not_memoized() {
        let mock = MockHttpClient::new();
        mock.push_json(200, json!({"status": "success", "response": [true]}));
        mock.push_json(200, json!({"status": "success", "content": []}));
        mock.push_json(200, json!({"status": "success", "response": [true]}));
        mock.push_json(200, directdl());
        let client = client(&mock);

        assert!(client.cached_files(&magnet()).await.unwrap().is_empty());
        let files = client.cached_files(&magnet()).await.unwrap();
        assert_eq!(files[0].path, "movie.mp4");
        assert_eq!(mock.request_count(), 4);
    }

    #[tokio::test]
    async fn test_not_cached_is_empty_and_link_fails() {
        let mock = MockHttpClient::new();
        mock.push_json(200, json!({"status": "success", "response": [false]}));
        mock.push_json(200, json!({"status": "success", "response": [false]}));
        let client = client(&mock);

        assert!(client.cached_files(&magnet()).await.unwrap().is_empty());
        assert!(matches!(
            client.download_link(&magnet(), "movie.mp4").await,
            Err(DebridError::NotCached { .. })
        ));
    }

    #[tokio::test]
    async fn test_download_link_prefers_direct_link() {
        let mock = MockHttpClient::new();
        mock.push_json(200, json!({"status": "success", "response": [true]}));
        mock.push_json(200, directdl());
        let client = client(&mock);

        let link = client.download_link(&magnet(), "/movie.mp4").await.unwrap();
        assert_eq!(link, "https://pm.example/dl/movie.mp4");
        assert!(matches!(
            client.download_link(&magnet(), "other.mp4").await,
            Err(DebridError::FileNotFound { .. })
        ));
        assert!(client.is_file_cached(&magnet(), "movie.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_add_magnet_creates_once_then_reuses() {
        let mock = MockHttpClient::new();
        mock.push_json(200, json!({"status": "success", "transfers": []}));
        mock.push_json(200, json!({"status": "success", "id": "tr-1", "name": "movie", "type": "torrent"}));
        mock.push_json(
            200,
            json!({"status": "success", "transfers": [{"id": "tr-1", "src": magnet()}]}),
        );
        let client = client(&mock);

        let first = client.add_magnet(&magnet()).await.unwrap();
        let second = client.add_magnet(&magnet()).await.unwrap();
        assert_eq!(first, "tr-1");
        assert_eq!(second, first);
        assert_eq!(mock.requests()[1].form_value("src"), Some(magnet().as_str()));
    }

    #[tokio::test]
    async fn test_add_magnet_invalidates_cache() {
        let mock = MockHttpClient::new();
        mock.push_json(200, json!({"status": "success", "response": [true]}));
        mock.push_json(200, directdl());
        mock.push_json(
            200,
            json!({"status": "success", "transfers": [{"id": "tr-1", "src": magnet()}]}),
        );
        let client = client(&mock);

        client.cached_files(&magnet()).await.unwrap();
        assert_eq!(client.cache.len(), 1);
        client.add_magnet(&magnet()).await.unwrap();
        assert!(client.cache.is_empty());
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let mock = MockHttpClient::new();
        mock.push_json(200, json!({"status": "error", "message": "Invalid apikey"}));
        let client = client(&mock);

        let error = client.cached_files(&magnet()).await.unwrap_err();
        assert!(matches!(
            error,
            DebridError::Provider {
                category: ErrorCategory::Authentication,
                ref message,
                ..
            } if message == "Invalid apikey"
        ));
    }
}
