//! Canonical data types returned by every adapter.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Debrid providers supported by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    RealDebrid,
    AllDebrid,
    Premiumize,
    TorBox,
    DebridLink,
}

impl Provider {
    /// All providers in declaration order.
    pub const ALL: [Provider; 5] = [
        Provider::RealDebrid,
        Provider::AllDebrid,
        Provider::Premiumize,
        Provider::TorBox,
        Provider::DebridLink,
    ];
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::RealDebrid => "RealDebrid",
            Provider::AllDebrid => "AllDebrid",
            Provider::Premiumize => "Premiumize",
            Provider::TorBox => "TorBox",
            Provider::DebridLink => "DebridLink",
        };
        f.write_str(name)
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        match compact.as_str() {
            "realdebrid" | "rd" => Ok(Provider::RealDebrid),
            "alldebrid" | "ad" => Ok(Provider::AllDebrid),
            "premiumize" | "pm" => Ok(Provider::Premiumize),
            "torbox" | "tb" => Ok(Provider::TorBox),
            "debridlink" | "dl" => Ok(Provider::DebridLink),
            _ => Err(format!("Unknown provider: {s}")),
        }
    }
}

/// A file inside a cached torrent.
///
/// `path` is normalized (forward slashes, no leading slash) and is the key
/// callers pass back into `download_link`. `provider_data` keeps the raw
/// provider record for adapter-internal use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub path: String,
    pub size: u64,
    #[serde(default)]
    pub provider_data: Map<String, Value>,
}

impl File {
    pub fn new(path: impl Into<String>, size: u64, provider_data: Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            size,
            provider_data,
        }
    }

    /// File name without directory components.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Extension without the dot, empty when the name has none.
    pub fn extension(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => "",
            Some(index) => &name[index + 1..],
        }
    }

    /// Format file size in human-readable format.
    pub fn format_size(&self) -> String {
        const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

        let mut value = self.size as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }

        let rounded = (value * 100.0).round() / 100.0;
        format!("{rounded} {}", UNITS[unit])
    }

    /// String field from the raw provider record, ignoring empty values.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.provider_data
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Shared readiness classification of a provider's tracking record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    /// Registered but files or links are not available yet
    Pending,
    /// Files and links are enumerable
    Ready,
    /// Provider reported a terminal failure
    Error,
}

/// A provider's tracking unit for one magnet ("transfer", "magnet", "torrent").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteItem {
    pub id: String,
    pub hash: String,
    pub name: String,
    pub status: ItemStatus,
    /// Provider-specific status text, kept for error messages
    pub raw_status: String,
    pub files: Vec<File>,
    pub added: Option<DateTime<Utc>>,
}

impl RemoteItem {
    pub fn is_ready(&self) -> bool {
        self.status == ItemStatus::Ready
    }

    /// Finds a file by normalized path.
    pub fn find_file(&self, path: &str) -> Option<&File> {
        let wanted = normalize_path(path);
        self.files.iter().find(|file| file.path == wanted)
    }
}

/// Normalizes a provider or caller path for comparison.
///
/// Converts backslashes, collapses repeated separators and removes the
/// leading slash. Applying it twice yields the same result.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Drops the synthetic torrent-name folder from a nested path.
///
/// "SomeTorrent/file.mp4" becomes "file.mp4"; flat paths are unchanged.
pub fn strip_root_folder(path: &str) -> String {
    let normalized = normalize_path(path);
    match normalized.split_once('/') {
        Some((_, rest)) => rest.to_string(),
        None => normalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/movie/movie.mp4"), "movie/movie.mp4");
        assert_eq!(normalize_path("a\\b//c.mkv"), "a/b/c.mkv");
        assert_eq!(normalize_path("file.mkv"), "file.mkv");
        assert_eq!(normalize_path(""), "");

        let once = normalize_path("//x///y/z");
        assert_eq!(normalize_path(&once), once);
    }

    #[test]
    fn test_strip_root_folder() {
        assert_eq!(strip_root_folder("movie/movie.mp4"), "movie.mp4");
        assert_eq!(strip_root_folder("Show/Season 1/e01.mkv"), "Season 1/e01.mkv");
        assert_eq!(strip_root_folder("flat.mkv"), "flat.mkv");
        assert_eq!(strip_root_folder("/Root/file.srt"), "file.srt");
    }

    #[test]
    fn test_file_helpers() {
        let file = File::new("Season 1/episode.01.mkv", 1_572_864, Map::new());
        assert_eq!(file.file_name(), "episode.01.mkv");
        assert_eq!(file.extension(), "mkv");
        assert_eq!(file.format_size(), "1.5 MB");

        let hidden = File::new(".nfo", 512, Map::new());
        assert_eq!(hidden.extension(), "");
        assert_eq!(hidden.format_size(), "512 B");
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("real-debrid".parse::<Provider>(), Ok(Provider::RealDebrid));
        assert_eq!("AllDebrid".parse::<Provider>(), Ok(Provider::AllDebrid));
        assert_eq!("torbox".parse::<Provider>(), Ok(Provider::TorBox));
        assert_eq!("debrid_link".parse::<Provider>(), Ok(Provider::DebridLink));
        assert!("putio".parse::<Provider>().is_err());

        for provider in Provider::ALL {
            assert_eq!(provider.to_string().parse::<Provider>(), Ok(provider));
        }
    }
}
