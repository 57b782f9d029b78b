//! Common contract implemented by every provider adapter.

use async_trait::async_trait;

use crate::errors::DebridError;
use crate::types::{File, Provider, normalize_path};

/// Uniform operations over a debrid provider.
///
/// Implementations keep all protocol variance (status vocabularies, number
/// of round trips, link unrestriction) internal; callers only see canonical
/// [`File`] lists, URLs and remote IDs. Every operation validates the
/// magnet before the first network call.
#[async_trait]
pub trait DebridStrategy: Send + Sync + std::fmt::Debug {
    /// Provider this adapter talks to.
    fn provider(&self) -> Provider;

    /// Stores the auth credential used by subsequent calls.
    ///
    /// # Errors
    /// - `DebridError::InvalidCredential` - Token is empty
    fn set_token(&self, token: &str) -> Result<(), DebridError>;

    /// Returns the file list when the magnet is already cached at the provider.
    ///
    /// A magnet that is not cached yields an empty list, not an error.
    ///
    /// # Errors
    /// - `DebridError::InvalidMagnet` - No parseable info-hash
    /// - `DebridError::MissingCredential` - Token not set
    /// - `DebridError::Transport` - HTTP failure
    /// - `DebridError::Provider` - Provider error or failed remote item
    async fn cached_files(&self, magnet: &str) -> Result<Vec<File>, DebridError>;

    /// Checks whether `path` is among the cached files of `magnet`.
    ///
    /// # Errors
    /// Same as [`DebridStrategy::cached_files`].
    async fn is_file_cached(&self, magnet: &str, path: &str) -> Result<bool, DebridError> {
        let wanted = normalize_path(path);
        let files = self.cached_files(magnet).await?;
        Ok(files.iter().any(|file| normalize_path(&file.path) == wanted))
    }

    /// Resolves a directly downloadable URL for one file.
    ///
    /// # Errors
    /// - `DebridError::NotCached` - Magnet not available at the provider
    /// - `DebridError::NotReady` - Remote item still processing
    /// - `DebridError::FileNotFound` - No file with this path
    /// - `DebridError::LinkUnavailable` - File matched but has no link
    /// - plus every error of [`DebridStrategy::cached_files`]
    async fn download_link(&self, magnet: &str, path: &str) -> Result<String, DebridError>;

    /// Registers the magnet, reusing an existing record with the same hash.
    ///
    /// # Errors
    /// - `DebridError::InvalidMagnet` - No parseable info-hash
    /// - `DebridError::Provider` - Provider refused the magnet
    /// - `DebridError::Transport` - HTTP failure or missing ID in the response
    async fn add_magnet(&self, magnet: &str) -> Result<String, DebridError>;
}
