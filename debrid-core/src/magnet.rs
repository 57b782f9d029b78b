//! Magnet link parsing and info-hash handling

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::DebridError;

static BTIH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)urn:btih:([a-f0-9]{40})").expect("info-hash pattern is valid")
});

/// SHA-1 info-hash identifying a torrent.
///
/// Displayed as 40 lowercase hex characters, which is the form every
/// provider accepts in queries and returns in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InfoHash([u8; 20]);

impl InfoHash {
    /// Creates InfoHash from 20-byte SHA-1 hash.
    pub fn new(hash: [u8; 20]) -> Self {
        Self(hash)
    }

    /// Parses a 40-character hex string, ignoring case.
    ///
    /// # Errors
    /// - `DebridError::InvalidMagnet` - Wrong length or non-hex characters
    pub fn from_hex(hex_str: &str) -> Result<Self, DebridError> {
        let mut hash = [0u8; 20];
        hex::decode_to_slice(hex_str, &mut hash).map_err(|e| DebridError::InvalidMagnet {
            reason: format!("Invalid info hash '{hex_str}': {e}"),
        })?;
        Ok(Self(hash))
    }

    /// Returns reference to underlying 20-byte hash.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Case-insensitive comparison against a provider-reported hash string.
    pub fn matches(&self, other: &str) -> bool {
        InfoHash::from_hex(other.trim()).is_ok_and(|other| other == *self)
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Caller-supplied magnet URI with its extracted info-hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagnetHandle {
    uri: String,
    info_hash: InfoHash,
}

impl MagnetHandle {
    /// Parses a magnet URI and extracts its BitTorrent info-hash.
    ///
    /// # Errors
    /// - `DebridError::InvalidMagnet` - No `urn:btih:` followed by 40 hex characters
    pub fn parse(uri: &str) -> Result<Self, DebridError> {
        let info_hash = extract_info_hash(uri)?;
        Ok(Self {
            uri: uri.to_string(),
            info_hash,
        })
    }

    /// Raw magnet URI as supplied by the caller.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn info_hash(&self) -> InfoHash {
        self.info_hash
    }

    /// Lowercase hex form of the info-hash.
    pub fn hash_hex(&self) -> String {
        self.info_hash.to_string()
    }

    /// Display name (`dn` parameter) if the magnet carries one.
    pub fn display_name(&self) -> Option<String> {
        let parsed = url::Url::parse(&self.uri).ok()?;
        parsed
            .query_pairs()
            .find(|(key, _)| key == "dn")
            .map(|(_, value)| value.into_owned())
    }
}

impl fmt::Display for MagnetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "magnet {}", self.info_hash)
    }
}

/// Extracts the lowercase info-hash from anywhere in a magnet URI.
///
/// # Errors
/// - `DebridError::InvalidMagnet` - Hash absent or malformed
pub fn extract_info_hash(magnet: &str) -> Result<InfoHash, DebridError> {
    let captures = BTIH_PATTERN
        .captures(magnet)
        .ok_or_else(|| DebridError::InvalidMagnet {
            reason: "Could not extract hash".to_string(),
        })?;

    InfoHash::from_hex(&captures[1])
}
