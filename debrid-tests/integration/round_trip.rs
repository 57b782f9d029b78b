//! Every path `cached_files` reports must resolve through `download_link`.

use debrid_core::test_mocks::MockHttpClient;
use debrid_core::{DebridError, Provider};

use crate::common::{self, PATHS};

#[tokio::test]
async fn test_cached_files_are_canonical_across_providers() -> anyhow::Result<()> {
    for provider in Provider::ALL {
        let mock = MockHttpClient::new();
        common::script_cached_files(provider, &mock);
        let adapter = common::adapter(provider, &mock);

        let files = adapter.cached_files(&common::magnet()).await?;
        let paths: Vec<&str> = files.iter().map(|file| file.path.as_str()).collect();
        assert_eq!(paths, PATHS, "{provider} file paths");
        assert_eq!(files[0].size, 1_572_864, "{provider} file size");
        assert_eq!(mock.remaining(), 0, "{provider} left responses unused");
    }
    Ok(())
}

#[tokio::test]
async fn test_every_listed_path_resolves_to_a_link() -> anyhow::Result<()> {
    for provider in Provider::ALL {
        let mock = MockHttpClient::new();
        common::script_cached_files(provider, &mock);
        let files = common::adapter(provider, &mock)
            .cached_files(&common::magnet())
            .await?;

        for file in &files {
            let mock = MockHttpClient::new();
            common::script_download_link(provider, &mock, &file.path);
            let adapter = common::adapter(provider, &mock);

            let result = adapter.download_link(&common::magnet(), &file.path).await;
            assert!(
                !matches!(result, Err(DebridError::FileNotFound { .. })),
                "{provider} lost {} between listing and link resolution",
                file.path
            );
            let link = result?;
            assert!(link.starts_with("https://"), "{provider} returned {link}");
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_listed_path_without_remote_link_is_unavailable() -> anyhow::Result<()> {
    for provider in Provider::ALL {
        for path in PATHS {
            let mock = MockHttpClient::new();
            common::script_download_link_without_links(provider, &mock);
            let adapter = common::adapter(provider, &mock);

            let result = adapter.download_link(&common::magnet(), path).await;
            assert!(
                matches!(result, Err(DebridError::LinkUnavailable { .. })),
                "{provider} resolved {path} to {result:?}"
            );
            assert_eq!(mock.remaining(), 0, "{provider} left responses unused");
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_is_file_cached_accepts_leading_slash() -> anyhow::Result<()> {
    for provider in Provider::ALL {
        let mock = MockHttpClient::new();
        common::script_cached_files(provider, &mock);
        let adapter = common::adapter(provider, &mock);

        assert!(
            adapter
                .is_file_cached(&common::magnet(), "/Subs/en.srt")
                .await?,
            "{provider}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_memoizing_providers_list_once() -> anyhow::Result<()> {
    for provider in [Provider::Premiumize, Provider::TorBox, Provider::DebridLink] {
        let mock = MockHttpClient::new();
        common::script_cached_files(provider, &mock);
        let adapter = common::adapter(provider, &mock);

        let first = adapter.cached_files(&common::magnet()).await?;
        let requests = mock.request_count();
        let second = adapter.cached_files(&common::magnet()).await?;

        assert_eq!(first, second);
        assert_eq!(mock.request_count(), requests, "{provider} refetched");
    }
    Ok(())
}
