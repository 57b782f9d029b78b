//! Debrid-Link response schemas and mapping

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::ErrorCategory;
use crate::magnet::InfoHash;
use crate::providers::{decode_records, lenient};
use crate::types::{File, ItemStatus, RemoteItem, normalize_path};

/// Seedbox entry of `seedbox/list` and `seedbox/add`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct DlTorrent {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(rename = "hashString", deserialize_with = "lenient::string")]
    pub hash: String,
    #[serde(rename = "downloadPercent", deserialize_with = "lenient::u64")]
    pub download_percent: u64,
    #[serde(deserialize_with = "lenient::i64")]
    pub created: i64,
    #[serde(deserialize_with = "lenient::list")]
    pub files: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct DlFile {
    #[serde(deserialize_with = "lenient::string")]
    name: String,
    #[serde(deserialize_with = "lenient::u64")]
    size: u64,
}

/// Files listed for `info_hash` by `seedbox/cached`.
///
/// `value` is keyed by the hash as submitted; an absent key means not cached.
pub(crate) fn map_cached(value: &Value, info_hash: &InfoHash) -> Vec<File> {
    let Some(by_hash) = value.as_object() else {
        return Vec::new();
    };

    by_hash
        .iter()
        .find(|(hash, _)| info_hash.matches(hash))
        .and_then(|(_, entry)| entry.get("files"))
        .and_then(Value::as_array)
        .map(|files| map_files(files))
        .unwrap_or_default()
}

pub(crate) fn map_files(entries: &[Value]) -> Vec<File> {
    entries
        .iter()
        .filter_map(|raw| {
            let object = raw.as_object()?;
            let file: DlFile = serde_json::from_value(raw.clone()).ok()?;
            Some(File::new(normalize_path(&file.name), file.size, object.clone()))
        })
        .collect()
}

/// Decodes `value` of `seedbox/list` (a list) or `seedbox/add` (one object).
pub(crate) fn map_torrents(value: &Value) -> Vec<DlTorrent> {
    match value {
        Value::Array(entries) => decode_records(entries),
        object @ Value::Object(_) => serde_json::from_value(object.clone())
            .map(|torrent| vec![torrent])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Debrid-Link exposes only progress; 100 percent means every link is live.
pub(crate) fn classify(torrent: &DlTorrent) -> ItemStatus {
    if torrent.download_percent >= 100 {
        ItemStatus::Ready
    } else {
        ItemStatus::Pending
    }
}

pub(crate) fn map_item(torrent: &DlTorrent) -> RemoteItem {
    RemoteItem {
        id: torrent.id.clone(),
        hash: torrent.hash.to_lowercase(),
        name: torrent.name.clone(),
        status: classify(torrent),
        raw_status: format!("{}%", torrent.download_percent),
        files: map_files(&torrent.files),
        added: DateTime::<Utc>::from_timestamp(torrent.created, 0).filter(|_| torrent.created > 0),
    }
}

/// Maps Debrid-Link error strings to the shared categories.
pub(crate) fn classify_error(code: &str) -> ErrorCategory {
    match code {
        "badToken" | "unauthorized_client" | "access_denied" | "accountLocked" => {
            ErrorCategory::Authentication
        }
        "maxTorrent" | "maxLink" | "maxData" | "maxLinkHost" | "maxDataHost" | "freeServerOverload" => {
            ErrorCategory::QuotaExceeded
        }
        "notDebrid" | "notFreeHost" | "disabledServerHost" | "serverNotAllowed" => {
            ErrorCategory::UnsupportedLink
        }
        "fileNotAvailable" | "fileNotFound" | "badFileUrl" | "hidedByAdmin" => {
            ErrorCategory::FileUnavailable
        }
        "torrentTooBig" | "notFound" | "badArguments" => ErrorCategory::InvalidMagnet,
        _ => ErrorCategory::Other,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const HASH: &str = "34ff1fae9661d72152fb1fc31e27c15297072654";

    #[test]
    fn test_map_cached_by_hash() {
        let info_hash = InfoHash::from_hex(HASH).unwrap();
        let mut value = serde_json::Map::new();
        value.insert(
            HASH.to_string(),
            json!({"name": "Movie", "files": [
                {"name": "movie.mp4", "size": 1572864},
                {"name": "extras\\sample.mkv", "size": "20"},
                false
            ]}),
        );

        let files = map_cached(&Value::Object(value), &info_hash);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "movie.mp4");
        assert_eq!(files[1].path, "extras/sample.mkv");
        assert_eq!(files[1].size, 20);

        assert!(map_cached(&json!({}), &info_hash).is_empty());
        assert!(map_cached(&json!([]), &info_hash).is_empty());
    }

    #[test]
    fn test_map_item_progress() {
        let torrents = map_torrents(&json!([{
            "id": "dl-1",
            "hashString": HASH.to_uppercase(),
            "downloadPercent": 42,
            "created": 1714557600,
            "files": [{"id": "f1", "name": "movie.mp4", "size": 1, "downloadUrl": "https://dl/f1"}]
        }]));

        let item = map_item(&torrents[0]);
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.raw_status, "42%");
        assert_eq!(item.hash, HASH);
        assert!(item.added.is_some());
        assert_eq!(
            item.find_file("movie.mp4").and_then(|f| f.data_str("downloadUrl")),
            Some("https://dl/f1")
        );

        let done = DlTorrent {
            download_percent: 100,
            ..DlTorrent::default()
        };
        assert_eq!(classify(&done), ItemStatus::Ready);
    }

    #[test]
    fn test_classify_error() {
        assert_eq!(classify_error("badToken"), ErrorCategory::Authentication);
        assert_eq!(classify_error("maxTorrent"), ErrorCategory::QuotaExceeded);
        assert_eq!(classify_error("floodDetected"), ErrorCategory::Other);
    }
}
