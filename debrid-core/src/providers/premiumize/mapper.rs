//! Premiumize response schemas and mapping

use serde::Deserialize;
use serde_json::Value;

use crate::errors::ErrorCategory;
use crate::magnet::extract_info_hash;
use crate::providers::{decode_records, lenient};
use crate::types::{File, strip_root_folder};

/// Body of `POST transfer/directdl`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PmDirectDl {
    #[serde(deserialize_with = "lenient::list")]
    pub content: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct PmContent {
    #[serde(deserialize_with = "lenient::string")]
    path: String,
    #[serde(deserialize_with = "lenient::u64")]
    size: u64,
}

/// Entry of `GET transfer/list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PmTransfer {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(deserialize_with = "lenient::string")]
    pub src: String,
}

impl PmTransfer {
    /// Info-hash carried in the transfer's source magnet, if any.
    pub fn hash(&self) -> Option<String> {
        extract_info_hash(&self.src).ok().map(|hash| hash.to_string())
    }
}

/// Body of `POST transfer/create`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PmCreated {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
}

/// Reads `response[0]` of `cache/check`.
pub(crate) fn is_cached(body: &Value) -> bool {
    match body.get("response").and_then(|response| response.get(0)) {
        Some(Value::Bool(cached)) => *cached,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        Some(Value::String(s)) => s == "true" || s == "1",
        _ => false,
    }
}

/// Maps directdl content, dropping the torrent-name root folder.
pub(crate) fn map_files(directdl: &PmDirectDl) -> Vec<File> {
    directdl
        .content
        .iter()
        .filter_map(|raw| {
            let object = raw.as_object()?;
            let entry: PmContent = serde_json::from_value(raw.clone()).ok()?;
            Some(File::new(
                strip_root_folder(&entry.path),
                entry.size,
                object.clone(),
            ))
        })
        .collect()
}

/// Decodes the `transfers` member of `transfer/list`.
pub(crate) fn map_transfers(body: &Value) -> Vec<PmTransfer> {
    match body.get("transfers") {
        Some(Value::Array(transfers)) => decode_records(transfers),
        _ => Vec::new(),
    }
}

/// Prefers the direct `link`, falling back to `stream_link`.
pub(crate) fn preferred_link(file: &File) -> Option<&str> {
    file.data_str("link").or_else(|| file.data_str("stream_link"))
}

/// Classifies a Premiumize error message; the API has no error codes.
pub(crate) fn classify_error(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();
    if lower.contains("apikey") || lower.contains("not logged in") || lower.contains("auth") {
        ErrorCategory::Authentication
    } else if lower.contains("limit") || lower.contains("premium") || lower.contains("fair use") {
        ErrorCategory::QuotaExceeded
    } else if lower.contains("magnet") || lower.contains("hash") {
        ErrorCategory::InvalidMagnet
    } else {
        ErrorCategory::Other
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::transport::decode_value;

    #[test]
    fn test_map_files_strips_root_folder() {
        let directdl: PmDirectDl = decode_value(json!({
            "status": "success",
            "content": [
                {"path": "movie/movie.mp4", "size": 1572864, "link": "https://pm/dl/movie.mp4"},
                {"path": "flat.nfo", "size": "40"},
                "garbage"
            ]
        }))
        .unwrap();

        let files = map_files(&directdl);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "movie.mp4");
        assert_eq!(files[0].size, 1_572_864);
        assert_eq!(files[0].format_size(), "1.5 MB");
        assert_eq!(files[1].path, "flat.nfo");
        assert_eq!(files[1].size, 40);
    }

    #[test]
    fn test_is_cached_variants() {
        assert!(is_cached(&json!({"response": [true]})));
        assert!(!is_cached(&json!({"response": [false]})));
        assert!(is_cached(&json!({"response": [1]})));
        assert!(!is_cached(&json!({"response": []})));
        assert!(!is_cached(&json!({})));
    }

    #[test]
    fn test_preferred_link() {
        let mut data = serde_json::Map::new();
        data.insert("stream_link".into(), json!("https://pm/stream"));
        let file = File::new("a.mkv", 1, data.clone());
        assert_eq!(preferred_link(&file), Some("https://pm/stream"));

        data.insert("link".into(), json!("https://pm/direct"));
        let file = File::new("a.mkv", 1, data);
        assert_eq!(preferred_link(&file), Some("https://pm/direct"));
    }

    #[test]
    fn test_transfer_hash_from_src() {
        let transfers = map_transfers(&json!({"status": "success", "transfers": [
            {"id": "t1", "src": "magnet:?xt=urn:btih:34FF1FAE9661D72152FB1FC31E27C15297072654"},
            {"id": "t2", "src": "https://example.com/file.torrent"}
        ]}));

        assert_eq!(
            transfers[0].hash().as_deref(),
            Some("34ff1fae9661d72152fb1fc31e27c15297072654")
        );
        assert_eq!(transfers[1].hash(), None);
    }

    #[test]
    fn test_classify_error() {
        assert_eq!(classify_error("Invalid apikey"), ErrorCategory::Authentication);
        assert_eq!(classify_error("Fair use limit reached"), ErrorCategory::QuotaExceeded);
        assert_eq!(classify_error("Something broke"), ErrorCategory::Other);
    }
}
