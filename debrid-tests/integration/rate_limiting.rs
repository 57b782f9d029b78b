//! HTTP 429 handling shared by all adapters.

use debrid_core::test_mocks::MockHttpClient;
use debrid_core::{DebridError, Provider, TransportError};
use serde_json::json;

use crate::common;

#[tokio::test]
async fn test_rate_limited_request_is_retried() -> anyhow::Result<()> {
    let mock = MockHttpClient::new();
    mock.push_raw(429, "");
    mock.push_raw(429, "{\"error\": \"too_many_requests\", \"error_code\": 34}");
    mock.push_json(200, json!([]));
    let adapter = common::adapter(Provider::RealDebrid, &mock);

    let files = adapter.cached_files(&common::magnet()).await?;
    assert!(files.is_empty());
    assert_eq!(mock.request_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_rate_limit_gives_up_after_three_attempts() {
    for provider in Provider::ALL {
        let mock = MockHttpClient::new();
        for _ in 0..4 {
            mock.push_raw(429, "");
        }
        let adapter = common::adapter(provider, &mock);

        let error = adapter.cached_files(&common::magnet()).await.unwrap_err();
        assert!(
            matches!(
                error,
                DebridError::Transport(TransportError::Status { status: 429, .. })
            ),
            "{provider}: {error}"
        );
        assert!(error.is_retryable());
        assert_eq!(mock.request_count(), 3, "{provider}");
        assert_eq!(mock.remaining(), 1);
    }
}

#[tokio::test]
async fn test_retry_keeps_auth_placement() -> anyhow::Result<()> {
    let mock = MockHttpClient::new();
    mock.push_raw(429, "");
    mock.push_json(200, json!({"status": "success", "response": [false]}));
    let adapter = common::adapter(Provider::Premiumize, &mock);

    adapter.cached_files(&common::magnet()).await?;

    for request in mock.requests() {
        assert_eq!(request.query_value("apikey"), Some("integration-token"));
    }
    Ok(())
}
