//! `DebridClient` routing and configuration checks.

use debrid_core::test_mocks::MockHttpClient;
use debrid_core::{DebridClient, DebridConfig, DebridError, Provider};
use serde_json::json;

use crate::common::{self, PATHS};

fn facade(mock: &std::sync::Arc<MockHttpClient>) -> DebridClient {
    DebridClient::with_http_client(DebridConfig::for_testing(), mock.clone())
}

#[tokio::test]
async fn test_facade_forwards_to_selected_provider() -> anyhow::Result<()> {
    for provider in Provider::ALL {
        let mock = MockHttpClient::new();
        let mut client = facade(&mock);
        client.use_provider(provider)?.set_token("facade-token")?;

        common::script_cached_files(provider, &mock);
        let files = client.cached_files(&common::magnet()).await?;
        assert_eq!(files.len(), PATHS.len(), "{provider}");
    }
    Ok(())
}

#[tokio::test]
async fn test_facade_requires_provider_then_token() {
    let mock = MockHttpClient::new();
    let mut client = facade(&mock);

    assert!(matches!(
        client.download_link(&common::magnet(), "movie.mkv").await,
        Err(DebridError::InvalidConfiguration { .. })
    ));

    client
        .use_provider(Provider::RealDebrid)
        .expect("provider");
    assert!(matches!(
        client.is_file_cached(&common::magnet(), "movie.mkv").await,
        Err(DebridError::InvalidConfiguration { .. })
    ));
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn test_facade_switches_provider_at_runtime() -> anyhow::Result<()> {
    let mock = MockHttpClient::new();
    let mut client = facade(&mock);
    client.set_token("facade-token")?;

    client.use_provider(Provider::TorBox)?;
    mock.push_json(200, json!({"success": true, "data": []}));
    assert!(client.cached_files(&common::magnet()).await?.is_empty());
    assert_eq!(
        mock.last_request().and_then(|r| r.header("authorization").map(str::to_string)),
        Some("Bearer facade-token".to_string())
    );

    client.use_provider(Provider::AllDebrid)?;
    assert_eq!(client.provider(), Some(Provider::AllDebrid));
    mock.push_json(200, json!({"status": "success", "data": {"magnets": []}}));
    assert!(client.cached_files(&common::magnet()).await?.is_empty());

    let request = mock.last_request().expect("request");
    assert_eq!(request.path(), "/v4.1/magnet/status");
    assert_eq!(request.query_value("apikey"), Some("facade-token"));
    Ok(())
}

#[tokio::test]
async fn test_provider_error_surfaces_through_facade() -> anyhow::Result<()> {
    let mock = MockHttpClient::new();
    let mut client = facade(&mock);
    client.use_provider(Provider::Premiumize)?.set_token("expired")?;

    mock.push_json(200, json!({"status": "error", "message": "Invalid apikey"}));
    let error = client.cached_files(&common::magnet()).await.unwrap_err();

    assert!(error.requires_reauthentication());
    assert_eq!(error.user_message(), "Premiumize rejected the token");
    Ok(())
}
