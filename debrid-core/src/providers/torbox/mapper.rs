//! TorBox response schemas and mapping

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::ErrorCategory;
use crate::magnet::InfoHash;
use crate::providers::{decode_records, lenient};
use crate::types::{File, ItemStatus, RemoteItem, normalize_path, strip_root_folder};

/// Cache-check entry, shared by the list and hash-keyed response formats.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TbCached {
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub hash: String,
    #[serde(deserialize_with = "lenient::list")]
    pub files: Vec<Value>,
}

/// Entry of `GET /v1/api/torrents/mylist`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TbTorrent {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub hash: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub download_state: String,
    #[serde(deserialize_with = "lenient::bool")]
    pub download_finished: bool,
    #[serde(deserialize_with = "lenient::bool")]
    pub download_present: bool,
    #[serde(deserialize_with = "lenient::string")]
    pub created_at: String,
    #[serde(deserialize_with = "lenient::list")]
    pub files: Vec<Value>,
}

/// `data` of `POST /v1/api/torrents/createtorrent`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct TbCreated {
    #[serde(deserialize_with = "lenient::string")]
    pub torrent_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct TbFile {
    #[serde(deserialize_with = "lenient::string")]
    name: String,
    #[serde(deserialize_with = "lenient::u64")]
    size: u64,
}

/// Collapses runs of spaces and trims, as TorBox does to stored names.
pub(crate) fn collapse_spaces(path: &str) -> String {
    path.split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes a caller path so it compares equal to mapped file paths.
pub(crate) fn request_path(path: &str) -> String {
    collapse_spaces(&normalize_path(path))
}

/// Maps TorBox file records; the torrent-name folder is dropped.
pub(crate) fn map_files(entries: &[Value]) -> Vec<File> {
    entries
        .iter()
        .filter_map(|raw| {
            let object = raw.as_object()?;
            let file: TbFile = serde_json::from_value(raw.clone()).ok()?;
            Some(File::new(
                collapse_spaces(&strip_root_folder(&file.name)),
                file.size,
                object.clone(),
            ))
        })
        .collect()
}

/// Picks the entry for `info_hash` out of a cache-check `data` member.
///
/// `data` is a list with `format=list` and a hash-keyed object otherwise;
/// an empty list, empty object or `null` means not cached.
pub(crate) fn find_cached(data: &Value, info_hash: &InfoHash) -> Option<TbCached> {
    match data {
        Value::Array(entries) => {
            let entries: Vec<TbCached> = decode_records(entries);
            let by_hash = entries
                .iter()
                .position(|entry| info_hash.matches(&entry.hash));
            match by_hash {
                Some(index) => entries.into_iter().nth(index),
                // Single-hash queries may omit the hash field
                None if entries.len() == 1 && entries[0].hash.is_empty() => {
                    entries.into_iter().next()
                }
                None => None,
            }
        }
        Value::Object(by_hash) => by_hash
            .iter()
            .find(|(hash, _)| info_hash.matches(hash))
            .and_then(|(_, entry)| serde_json::from_value(entry.clone()).ok()),
        _ => None,
    }
}

/// Decodes `mylist` data in either list or single-object form.
pub(crate) fn map_torrents(data: &Value) -> Vec<TbTorrent> {
    match data {
        Value::Array(entries) => decode_records(entries),
        object @ Value::Object(_) => serde_json::from_value(object.clone())
            .map(|torrent| vec![torrent])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Ready once the download finished and the files are present on TorBox.
pub(crate) fn classify(torrent: &TbTorrent) -> ItemStatus {
    let state = torrent.download_state.to_lowercase();
    if torrent.download_finished && torrent.download_present {
        ItemStatus::Ready
    } else if state.starts_with("error") || state.starts_with("failed") {
        ItemStatus::Error
    } else {
        ItemStatus::Pending
    }
}

pub(crate) fn map_item(torrent: &TbTorrent) -> RemoteItem {
    let status = classify(torrent);
    RemoteItem {
        id: torrent.id.clone(),
        hash: torrent.hash.to_lowercase(),
        name: torrent.name.clone(),
        status,
        raw_status: torrent.download_state.clone(),
        files: map_files(&torrent.files),
        added: DateTime::parse_from_rfc3339(&torrent.created_at)
            .ok()
            .map(|date| date.with_timezone(&Utc)),
    }
}

/// Maps TorBox error codes to the shared categories.
pub(crate) fn classify_error(code: &str) -> ErrorCategory {
    match code {
        "BAD_TOKEN" | "AUTH_ERROR" | "NO_AUTH" | "INVALID_TOKEN" => ErrorCategory::Authentication,
        "ACTIVE_LIMIT" | "MONTHLY_LIMIT" | "COOLDOWN_LIMIT" | "PLAN_RESTRICTED_FEATURE" => {
            ErrorCategory::QuotaExceeded
        }
        "DOWNLOAD_NOT_CACHED" => ErrorCategory::NotReady,
        "ITEM_NOT_FOUND" | "DOWNLOAD_SERVER_ERROR" => ErrorCategory::FileUnavailable,
        "INVALID_MAGNET" | "BAD_MAGNET" => ErrorCategory::InvalidMagnet,
        _ => ErrorCategory::Other,
    }
}
