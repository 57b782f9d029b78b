//! Malformed magnets fail before any network call, on every provider.

use debrid_core::test_mocks::MockHttpClient;
use debrid_core::{DebridError, DebridStrategy, Provider};
use proptest::prelude::*;

use crate::common;

const INVALID: [&str; 5] = [
    "",
    "magnet:?dn=no-hash",
    "magnet:?xt=urn:btih:34ff1fae9661d72152fb1fc31e27c1529707265",
    "magnet:?xt=urn:btih:zzzz1fae9661d72152fb1fc31e27c15297072654",
    "https://example.com/movie.torrent",
];

async fn assert_rejected_everywhere(adapter: &dyn DebridStrategy, magnet: &str) {
    let provider = adapter.provider();
    assert!(
        matches!(
            adapter.cached_files(magnet).await,
            Err(DebridError::InvalidMagnet { .. })
        ),
        "{provider} cached_files accepted {magnet:?}"
    );
    assert!(
        matches!(
            adapter.is_file_cached(magnet, "movie.mkv").await,
            Err(DebridError::InvalidMagnet { .. })
        ),
        "{provider} is_file_cached accepted {magnet:?}"
    );
    assert!(
        matches!(
            adapter.download_link(magnet, "movie.mkv").await,
            Err(DebridError::InvalidMagnet { .. })
        ),
        "{provider} download_link accepted {magnet:?}"
    );
    assert!(
        matches!(
            adapter.add_magnet(magnet).await,
            Err(DebridError::InvalidMagnet { .. })
        ),
        "{provider} add_magnet accepted {magnet:?}"
    );
}

#[tokio::test]
async fn test_known_invalid_magnets_make_no_requests() {
    for provider in Provider::ALL {
        let mock = MockHttpClient::new();
        let adapter = common::adapter(provider, &mock);

        for magnet in INVALID {
            assert_rejected_everywhere(adapter.as_ref(), magnet).await;
        }
        assert_eq!(mock.request_count(), 0, "{provider} hit the network");
    }
}

#[tokio::test]
async fn test_validation_precedes_credential_check() {
    let mock = MockHttpClient::new();
    let adapter = debrid_core::create_adapter_with_client(
        Provider::TorBox,
        mock.clone(),
        &debrid_core::DebridConfig::for_testing(),
    )
    .expect("adapter");

    assert!(matches!(
        adapter.cached_files("magnet:?dn=x").await,
        Err(DebridError::InvalidMagnet { .. })
    ));
    assert!(matches!(
        adapter.cached_files(&common::magnet()).await,
        Err(DebridError::MissingCredential)
    ));
    assert_eq!(mock.request_count(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Strings over an alphabet without `b` or digits can never carry a btih hash.
    #[test]
    fn prop_hashless_magnets_are_rejected(tail in "[c-z:?=&%]{0,80}") {
        let magnet = format!("magnet:?xt={tail}");
        for provider in Provider::ALL {
            let mock = MockHttpClient::new();
            let adapter = common::adapter(provider, &mock);
            tokio_test::block_on(assert_rejected_everywhere(adapter.as_ref(), &magnet));
            prop_assert_eq!(mock.request_count(), 0);
        }
    }
}
