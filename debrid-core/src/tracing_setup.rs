//! Tracing setup for applications embedding the debrid client.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the host. This helper installs a console subscriber for binaries
//! and examples that have no logging setup of their own.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Initialize console tracing at `level`, unless `RUST_LOG` overrides it.
///
/// # Errors
///
/// - `Box<dyn std::error::Error>` - If a global subscriber is already installed
pub fn init_tracing(level: LogLevel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(console_layer)
        .try_init()?;

    tracing::debug!("Tracing initialized: console={}", level);
    Ok(())
}

/// Log levels accepted by [`init_tracing`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Warning and error messages
    #[default]
    Warn,
    /// Informational, warning, and error messages
    Info,
    /// Per-request debug output
    Debug,
    /// All messages including detailed tracing
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_renders_filter_directive() {
        assert_eq!(LogLevel::default(), LogLevel::Warn);
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert!(EnvFilter::try_new(LogLevel::Trace.to_string()).is_ok());
    }

    #[test]
    fn test_init_tracing_twice_fails() {
        // Another test may already own the global subscriber
        let _ = init_tracing(LogLevel::Debug);
        assert!(init_tracing(LogLevel::Debug).is_err());
    }
}
