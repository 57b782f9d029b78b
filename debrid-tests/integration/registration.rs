//! `add_magnet` is idempotent per info-hash.

use debrid_core::Provider;
use debrid_core::test_mocks::MockHttpClient;

use crate::common;

#[tokio::test]
async fn test_add_magnet_twice_returns_same_id() -> anyhow::Result<()> {
    for provider in Provider::ALL {
        let mock = MockHttpClient::new();
        let expected = common::script_registration(provider, &mock);
        let adapter = common::adapter(provider, &mock);

        let first = adapter.add_magnet(&common::magnet()).await?;
        let second = adapter.add_magnet(&common::magnet()).await?;

        assert_eq!(first, expected, "{provider}");
        assert_eq!(second, first, "{provider}");
        assert_eq!(mock.remaining(), 0, "{provider} left responses unused");
    }
    Ok(())
}

#[tokio::test]
async fn test_registration_uploads_the_raw_magnet() -> anyhow::Result<()> {
    let mock = MockHttpClient::new();
    common::script_registration(Provider::AllDebrid, &mock);
    let adapter = common::adapter(Provider::AllDebrid, &mock);

    adapter.add_magnet(&common::magnet()).await?;

    let upload = &mock.requests()[1];
    assert_eq!(upload.path(), "/v4/magnet/upload");
    assert_eq!(upload.form_value("magnets[]"), Some(common::magnet().as_str()));
    Ok(())
}
