//! Debrid Core - Unified client for debrid torrent-cache providers
//!
//! One contract, [`DebridStrategy`], implemented for Real-Debrid, AllDebrid,
//! Premiumize, TorBox and Debrid-Link. Callers ask whether a magnet is
//! cached, list its files, resolve direct download URLs and register new
//! magnets without knowing each provider's protocol.

pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod magnet;
pub mod providers;
pub mod strategy;
pub mod tracing_setup;
pub mod transport;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_mocks;

// Re-export main types for convenient access
pub use client::DebridClient;
pub use config::{DebridConfig, HttpConfig, RetryConfig};
pub use errors::{DebridError, ErrorCategory, TransportError};
pub use magnet::{InfoHash, MagnetHandle, extract_info_hash};
pub use providers::{
    AllDebridClient, DebridLinkClient, PremiumizeClient, RealDebridClient, TorBoxClient,
    create_adapter, create_adapter_with_client,
};
pub use strategy::DebridStrategy;
pub use transport::{HttpClient, HttpRequest, HttpResponse, ReqwestClient};
pub use types::{File, ItemStatus, Provider, RemoteItem};

/// Result alias used across the crate's public API.
pub type Result<T> = std::result::Result<T, DebridError>;
