//! Real-Debrid response schemas and mapping

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::ErrorCategory;
use crate::providers::{decode_records, lenient};
use crate::types::{File, ItemStatus, RemoteItem, normalize_path};

/// Entry of `GET torrents`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RdTorrent {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub filename: String,
    #[serde(deserialize_with = "lenient::string")]
    pub hash: String,
    #[serde(deserialize_with = "lenient::u64")]
    pub bytes: u64,
    #[serde(deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(deserialize_with = "lenient::string")]
    pub added: String,
}

/// Body of `GET torrents/info/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RdTorrentInfo {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub filename: String,
    #[serde(deserialize_with = "lenient::string")]
    pub hash: String,
    #[serde(deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(deserialize_with = "lenient::string")]
    pub added: String,
    #[serde(deserialize_with = "lenient::list")]
    pub files: Vec<Value>,
    #[serde(deserialize_with = "lenient::list")]
    pub links: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RdFile {
    #[serde(deserialize_with = "lenient::u64")]
    id: u64,
    #[serde(deserialize_with = "lenient::string")]
    path: String,
    #[serde(deserialize_with = "lenient::u64")]
    bytes: u64,
    #[serde(deserialize_with = "lenient::u64")]
    selected: u64,
}

/// Body of `POST torrents/addMagnet`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RdAddedTorrent {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
}

/// Body of `POST unrestrict/link`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RdUnrestricted {
    #[serde(deserialize_with = "lenient::string")]
    pub download: String,
}

/// Real-Debrid torrent status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RdStatus {
    MagnetConversion,
    WaitingFilesSelection,
    Queued,
    Downloading,
    Compressing,
    Uploading,
    Downloaded,
    MagnetError,
    Error,
    Virus,
    Dead,
    Unknown,
}

impl RdStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "magnet_conversion" => RdStatus::MagnetConversion,
            "waiting_files_selection" => RdStatus::WaitingFilesSelection,
            "queued" => RdStatus::Queued,
            "downloading" => RdStatus::Downloading,
            "compressing" => RdStatus::Compressing,
            "uploading" => RdStatus::Uploading,
            "downloaded" => RdStatus::Downloaded,
            "magnet_error" => RdStatus::MagnetError,
            "error" => RdStatus::Error,
            "virus" => RdStatus::Virus,
            "dead" => RdStatus::Dead,
            _ => RdStatus::Unknown,
        }
    }

    pub fn classify(self) -> ItemStatus {
        match self {
            RdStatus::Downloaded => ItemStatus::Ready,
            RdStatus::MagnetError | RdStatus::Error | RdStatus::Virus | RdStatus::Dead => {
                ItemStatus::Error
            }
            RdStatus::MagnetConversion
            | RdStatus::WaitingFilesSelection
            | RdStatus::Queued
            | RdStatus::Downloading
            | RdStatus::Compressing
            | RdStatus::Uploading
            | RdStatus::Unknown => ItemStatus::Pending,
        }
    }
}

/// Maps `torrents/info` files, pairing selected files with `links` by position.
///
/// Real-Debrid only produces links for selected files, in file order. When
/// no file carries a selection flag every file takes part in the pairing.
pub(crate) fn map_files(info: &RdTorrentInfo) -> Vec<File> {
    let raw_files: Vec<&Value> = info.files.iter().filter(|v| v.is_object()).collect();
    let parsed: Vec<(RdFile, &Value)> = raw_files
        .iter()
        .filter_map(|raw| {
            serde_json::from_value::<RdFile>((*raw).clone())
                .ok()
                .map(|file| (file, *raw))
        })
        .collect();

    let any_selected = parsed.iter().any(|(file, _)| file.selected == 1);

    parsed
        .into_iter()
        .filter(|(file, _)| !any_selected || file.selected == 1)
        .enumerate()
        .map(|(position, (file, raw))| {
            let mut data = raw.as_object().cloned().unwrap_or_default();
            if let Some(link) = info.links.get(position).and_then(Value::as_str) {
                data.insert("link".to_string(), Value::String(link.to_string()));
            }
            data.insert("torrent_id".to_string(), Value::String(info.id.clone()));
            data.insert("file_id".to_string(), Value::from(file.id));

            File::new(normalize_path(&file.path), file.bytes, data)
        })
        .collect()
}

/// Maps one `torrents/info` body into the shared item model.
pub(crate) fn map_item(info: &RdTorrentInfo) -> RemoteItem {
    let status = RdStatus::parse(&info.status).classify();
    let files = if status == ItemStatus::Ready {
        map_files(info)
    } else {
        Vec::new()
    };

    RemoteItem {
        id: info.id.clone(),
        hash: info.hash.to_lowercase(),
        name: info.filename.clone(),
        status,
        raw_status: info.status.clone(),
        files,
        added: parse_added(&info.added),
    }
}

/// Decodes the `GET torrents` listing.
pub(crate) fn map_torrent_list(values: &[Value]) -> Vec<RdTorrent> {
    decode_records(values)
}

fn parse_added(added: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(added)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Maps Real-Debrid numeric error codes to the shared categories.
pub(crate) fn classify_error(code: Option<i64>, message: &str) -> ErrorCategory {
    match code {
        Some(8..=15 | 22) => ErrorCategory::Authentication,
        Some(16 | 17 | 19 | 20) => ErrorCategory::UnsupportedLink,
        Some(18 | 21 | 23 | 26 | 29 | 36) => ErrorCategory::QuotaExceeded,
        Some(24 | 28 | 35) => ErrorCategory::FileUnavailable,
        Some(30) => ErrorCategory::InvalidMagnet,
        _ if message.contains("bad_token") || message.contains("Unauthorized") => {
            ErrorCategory::Authentication
        }
        _ => ErrorCategory::Other,
    }
}
