//! Provider adapters: one module per debrid service.
//!
//! Each module pairs a pure mapper (typed partial schemas of the provider's
//! JSON, converted into canonical [`crate::types::File`] lists) with an
//! adapter implementing [`crate::strategy::DebridStrategy`].
//!
//! Mappers default-and-include: a record with missing or mistyped fields is
//! kept with empty/zero values, and only entries that are not JSON objects
//! are skipped.

pub mod all_debrid;
pub mod debrid_link;
pub mod premiumize;
pub mod real_debrid;
pub mod torbox;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use all_debrid::AllDebridClient;
pub use debrid_link::DebridLinkClient;
pub use premiumize::PremiumizeClient;
pub use real_debrid::RealDebridClient;
pub use torbox::TorBoxClient;

use crate::config::DebridConfig;
use crate::errors::{DebridError, TransportError};
use crate::strategy::DebridStrategy;
use crate::transport::{HttpClient, ReqwestClient};
use crate::types::Provider;

/// Creates the adapter for `provider` with a production HTTP client.
///
/// # Errors
/// - `DebridError::Transport` - HTTP client cannot be built
pub fn create_adapter(
    provider: Provider,
    config: &DebridConfig,
) -> Result<Box<dyn DebridStrategy>, DebridError> {
    let client: Arc<dyn HttpClient> = Arc::new(ReqwestClient::new(&config.http)?);
    create_adapter_with_client(provider, client, config)
}

/// Creates the adapter for `provider` over a caller-supplied HTTP client.
///
/// # Errors
/// - `DebridError::InvalidConfiguration` - Provider base URL cannot be parsed
pub fn create_adapter_with_client(
    provider: Provider,
    client: Arc<dyn HttpClient>,
    config: &DebridConfig,
) -> Result<Box<dyn DebridStrategy>, DebridError> {
    let adapter: Box<dyn DebridStrategy> = match provider {
        Provider::RealDebrid => Box::new(RealDebridClient::with_http_client(client, config)?),
        Provider::AllDebrid => Box::new(AllDebridClient::with_http_client(client, config)?),
        Provider::Premiumize => Box::new(PremiumizeClient::with_http_client(client, config)?),
        Provider::TorBox => Box::new(TorBoxClient::with_http_client(client, config)?),
        Provider::DebridLink => Box::new(DebridLinkClient::with_http_client(client, config)?),
    };
    Ok(adapter)
}

/// Decodes each object in `values`, skipping entries that are not objects.
pub(crate) fn decode_records<T: DeserializeOwned>(values: &[Value]) -> Vec<T> {
    values
        .iter()
        .filter(|value| value.is_object())
        .filter_map(|value| match serde_json::from_value(value.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!("Skipping undecodable record: {}", e);
                None
            }
        })
        .collect()
}

/// Error for a response that lacks the identifier a protocol step needs.
pub(crate) fn missing_field(provider: Provider, what: &str) -> DebridError {
    TransportError::Decode {
        reason: format!("{provider} response is missing {what}"),
    }
    .into()
}

/// Field deserializers that substitute defaults instead of failing.
///
/// Providers are inconsistent about types (IDs as numbers or strings, sizes
/// as strings, `null` for absent values); these accept any JSON value.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::{Map, Value};

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        })
    }

    pub fn u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        Ok(value_to_u64(&Value::deserialize(deserializer)?))
    }

    pub fn i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            Value::String(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        })
    }

    pub fn bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
            Value::String(s) => matches!(s.trim(), "true" | "1"),
            _ => false,
        })
    }

    pub fn list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Value>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items,
            _ => Vec::new(),
        })
    }

    pub fn object<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Map<String, Value>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Object(map) => map,
            _ => Map::new(),
        })
    }

    pub fn value_to_u64(value: &Value) -> u64 {
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .unwrap_or(0),
            Value::String(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}
