//! Error types shared by every provider adapter.

use thiserror::Error;

use crate::magnet::InfoHash;
use crate::types::Provider;

/// Coarse classification of a provider-signaled application error.
///
/// Each provider has its own error vocabulary; adapters translate their codes
/// into one of these classes so callers can decide between retrying,
/// re-authenticating, or surfacing the failure to an end user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Token rejected, expired, banned or missing on the provider side
    Authentication,
    /// Provider refused the magnet itself
    InvalidMagnet,
    /// Link or hoster is not supported by the provider
    UnsupportedLink,
    /// Provider is still processing the item
    NotReady,
    /// File exists but cannot be served
    FileUnavailable,
    /// Account quota, traffic or slot limit reached
    QuotaExceeded,
    /// Anything the adapter has no specific mapping for
    Other,
}

/// HTTP-layer failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Server answered with an error status that carried no provider error.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Short description of the failure
        message: String,
    },

    /// Request never produced a response.
    #[error("Request failed: {reason}")]
    Network {
        /// Underlying client error
        reason: String,
        /// Whether the per-request deadline elapsed
        timed_out: bool,
    },

    /// Response body was not valid JSON or lacked the provider envelope.
    #[error("Failed to decode response: {reason}")]
    Decode {
        /// Parser error or missing field description
        reason: String,
    },
}

impl TransportError {
    /// Returns the HTTP status code when the failure carried one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Network { .. } | TransportError::Decode { .. } => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        TransportError::Network {
            timed_out: error.is_timeout(),
            reason: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(error: serde_json::Error) -> Self {
        TransportError::Decode {
            reason: error.to_string(),
        }
    }
}

/// Errors returned by debrid adapters.
#[derive(Debug, Error)]
pub enum DebridError {
    #[error("Invalid magnet link: {reason}")]
    InvalidMagnet { reason: String },

    #[error("You must set the token before calling this method")]
    MissingCredential,

    #[error("Token cannot be empty")]
    InvalidCredential,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("{provider} error ({code}): {message}")]
    Provider {
        provider: Provider,
        code: String,
        message: String,
        category: ErrorCategory,
    },

    #[error("Magnet {info_hash} is not cached")]
    NotCached { info_hash: InfoHash },

    #[error("File with path '{path}' not found in magnet {info_hash}")]
    FileNotFound { info_hash: InfoHash, path: String },

    #[error("No download link available for '{path}'")]
    LinkUnavailable { path: String },

    #[error("Remote item {id} is not ready (status: {status})")]
    NotReady { id: String, status: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },
}

impl DebridError {
    /// Builds a provider error from a machine code and message.
    pub fn provider(
        provider: Provider,
        code: impl Into<String>,
        message: impl Into<String>,
        category: ErrorCategory,
    ) -> Self {
        DebridError::Provider {
            provider,
            code: code.into(),
            message: message.into(),
            category,
        }
    }

    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            DebridError::InvalidMagnet { .. } => "The magnet link is not valid".to_string(),
            DebridError::MissingCredential | DebridError::InvalidCredential => {
                "A provider token is required".to_string()
            }
            DebridError::Transport(TransportError::Network { timed_out: true, .. }) => {
                "The provider did not answer in time".to_string()
            }
            DebridError::Transport(_) => "Could not reach the provider".to_string(),
            DebridError::Provider {
                provider, category, ..
            } => match category {
                ErrorCategory::Authentication => format!("{provider} rejected the token"),
                ErrorCategory::QuotaExceeded => format!("{provider} account limit reached"),
                ErrorCategory::NotReady => format!("{provider} is still processing this torrent"),
                _ => format!("{provider} reported an error"),
            },
            DebridError::NotCached { .. } => "This torrent is not cached yet".to_string(),
            DebridError::FileNotFound { path, .. } => format!("File not found: {path}"),
            DebridError::LinkUnavailable { path } => format!("No link available for {path}"),
            DebridError::NotReady { .. } => "The torrent is still being processed".to_string(),
            DebridError::InvalidConfiguration { reason } => format!("Configuration error: {reason}"),
        }
    }

    /// Checks whether repeating the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            DebridError::NotReady { .. } => true,
            DebridError::Provider { category, .. } => *category == ErrorCategory::NotReady,
            DebridError::Transport(TransportError::Network { .. }) => true,
            DebridError::Transport(TransportError::Status { status, .. }) => {
                *status == 429 || *status >= 500
            }
            _ => false,
        }
    }

    /// Checks whether the caller should prompt for a new token.
    pub fn requires_reauthentication(&self) -> bool {
        match self {
            DebridError::MissingCredential | DebridError::InvalidCredential => true,
            DebridError::Provider { category, .. } => *category == ErrorCategory::Authentication,
            DebridError::Transport(TransportError::Status { status, .. }) => *status == 401,
            _ => false,
        }
    }

    /// Returns the HTTP status code for transport failures.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DebridError::Transport(e) => e.status_code(),
            _ => None,
        }
    }
}
