//! Centralized configuration for debrid adapters.
//!
//! All tunable parameters are defined here to avoid hard-coded values
//! scattered throughout the adapters.

use std::time::Duration;

/// Central configuration shared by every adapter.
#[derive(Debug, Clone, Default)]
pub struct DebridConfig {
    pub http: HttpConfig,
    pub retry: RetryConfig,
}

impl DebridConfig {
    /// Creates a configuration for deterministic tests: no retry delay.
    pub fn for_testing() -> Self {
        Self {
            http: HttpConfig::default(),
            retry: RetryConfig::for_testing(),
        }
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request deadline
    pub timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: &'static str,
    /// Application name some providers require as a query parameter
    pub agent_name: &'static str,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: "debridlib/0.1.0",
            agent_name: "debridlib",
        }
    }
}

/// Retry policy for rate-limited (HTTP 429) responses.
///
/// Attempts are counted in total, so `max_attempts = 3` means two retries.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    /// Same attempt budget as the default, without waiting.
    pub fn for_testing() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::ZERO,
        }
    }
}
