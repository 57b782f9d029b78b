//! AllDebrid response schemas and mapping

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::ErrorCategory;
use crate::providers::{decode_records, lenient};
use crate::types::{File, ItemStatus, RemoteItem, normalize_path};

/// Nesting limit for file groups; deeper entries are ignored.
const MAX_DEPTH: usize = 32;

/// Entry of `/v4.1/magnet/status`, in both list and single-id form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AdMagnet {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub filename: String,
    #[serde(deserialize_with = "lenient::string")]
    pub hash: String,
    #[serde(deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(rename = "statusCode", deserialize_with = "lenient::i64")]
    pub status_code: i64,
    #[serde(rename = "uploadDate", deserialize_with = "lenient::i64")]
    pub upload_date: i64,
    #[serde(deserialize_with = "lenient::list")]
    pub files: Vec<Value>,
}

/// `data` of `POST /v4/link/unlock`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AdUnlocked {
    #[serde(deserialize_with = "lenient::string")]
    pub link: String,
}

/// One entry of `data.magnets` in `POST /v4/magnet/upload`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AdUploaded {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::object")]
    pub error: Map<String, Value>,
}

/// Classifies `statusCode`: 4 is ready, 0 to 3 are processing stages.
pub(crate) fn classify_status(code: i64) -> ItemStatus {
    match code {
        4 => ItemStatus::Ready,
        0..=3 => ItemStatus::Pending,
        _ => ItemStatus::Error,
    }
}

/// Extracts the `data.magnets` list, tolerating a missing or non-list value.
pub(crate) fn map_magnet_list(data: &Value) -> Vec<AdMagnet> {
    match data.get("magnets") {
        Some(Value::Array(magnets)) => decode_records(magnets),
        _ => Vec::new(),
    }
}

/// Extracts the single magnet of a status-by-id response.
///
/// Depending on API revision `data.magnets` is the object itself or a
/// one-element list.
pub(crate) fn map_single_magnet(data: &Value) -> Option<AdMagnet> {
    match data.get("magnets")? {
        Value::Array(magnets) => decode_records(magnets).into_iter().next(),
        object @ Value::Object(_) => serde_json::from_value(object.clone()).ok(),
        _ => None,
    }
}

/// Flattens nested file groups into canonical files.
///
/// Leaves are `{n, s, l}`, folders are `{n, e: [...]}`. Folder names are
/// joined into the path. A single top-level folder named like the magnet is
/// dropped, so paths match the layout other providers report.
pub(crate) fn map_files(entries: &[Value], magnet_name: &str) -> Vec<File> {
    let root_is_torrent_folder = match entries {
        [only] => {
            only.get("e").is_some_and(Value::is_array)
                && only.get("n").and_then(Value::as_str) == Some(magnet_name)
        }
        _ => false,
    };

    let mut files = Vec::new();
    if root_is_torrent_folder {
        if let Some(Value::Array(children)) = entries[0].get("e") {
            flatten(children, "", 0, &mut files);
        }
    } else {
        flatten(entries, "", 0, &mut files);
    }
    files
}

fn flatten(entries: &[Value], prefix: &str, depth: usize, out: &mut Vec<File>) {
    if depth >= MAX_DEPTH {
        tracing::warn!("AllDebrid file tree deeper than {}, truncating", MAX_DEPTH);
        return;
    }

    for entry in entries {
        let Some(object) = entry.as_object() else {
            continue;
        };
        let name = object.get("n").and_then(Value::as_str).unwrap_or_default();
        let path = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}/{name}")
        };

        match object.get("e") {
            Some(Value::Array(children)) => flatten(children, &path, depth + 1, out),
            _ => {
                let size = object.get("s").map(lenient::value_to_u64).unwrap_or(0);
                out.push(File::new(normalize_path(&path), size, object.clone()));
            }
        }
    }
}

/// Maps one magnet record into the shared item model.
pub(crate) fn map_item(magnet: &AdMagnet) -> RemoteItem {
    let status = classify_status(magnet.status_code);
    let files = if status == ItemStatus::Ready {
        map_files(&magnet.files, &magnet.filename)
    } else {
        Vec::new()
    };

    RemoteItem {
        id: magnet.id.clone(),
        hash: magnet.hash.to_lowercase(),
        name: magnet.filename.clone(),
        status,
        raw_status: magnet.status.clone(),
        files,
        added: DateTime::<Utc>::from_timestamp(magnet.upload_date, 0)
            .filter(|_| magnet.upload_date > 0),
    }
}

/// Maps AllDebrid error codes to the shared categories.
pub(crate) fn classify_error(code: &str) -> ErrorCategory {
    match code {
        "USER_LINK_INVALID" | "LINK_ERROR" => ErrorCategory::FileUnavailable,
        "MAGNET_INVALID" | "MAGNET_TOO_MANY_FILES" => ErrorCategory::InvalidMagnet,
        "MAGNET_NO_SERVER" | "MAGNET_PROCESSING" => ErrorCategory::NotReady,
        code if code.starts_with("AUTH_") => ErrorCategory::Authentication,
        code if code.starts_with("LINK_") => ErrorCategory::UnsupportedLink,
        _ => ErrorCategory::Other,
    }
}
