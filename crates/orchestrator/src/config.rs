//! Pipeline configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// 500 MB.
pub const DEFAULT_FREE_TIER_BYTES: i64 = 524_288_000;
pub const DEFAULT_SIGNED_URL_EXPIRY_SECS: u64 = 3600;
pub const DEFAULT_RATE_LIMIT_PER_HOUR: u32 = 20;
pub const DEFAULT_TRANSFER_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_RETRIEVAL_LIMIT: i64 = 10;

/// Tunables for the inbound pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Storage limit given to new accounts.
    pub free_tier_bytes: i64,
    /// Lifetime of presigned retrieval links.
    pub signed_url_expiry: Duration,
    /// Attachment-carrying events admitted per sender per hour.
    pub rate_limit_per_hour: u32,
    /// Upper bound on a single download or upload.
    pub transfer_timeout: Duration,
    /// Files returned by one retrieval command.
    pub retrieval_limit: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            free_tier_bytes: DEFAULT_FREE_TIER_BYTES,
            signed_url_expiry: Duration::from_secs(DEFAULT_SIGNED_URL_EXPIRY_SECS),
            rate_limit_per_hour: DEFAULT_RATE_LIMIT_PER_HOUR,
            transfer_timeout: Duration::from_secs(DEFAULT_TRANSFER_TIMEOUT_SECS),
            retrieval_limit: DEFAULT_RETRIEVAL_LIMIT,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable values fall back to the defaults.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `FREE_TIER_BYTES` | `524288000` |
    /// | `SIGNED_URL_EXPIRY_SECONDS` | `3600` |
    /// | `RATE_LIMIT_PER_HOUR` | `20` |
    /// | `TRANSFER_TIMEOUT_SECS` | `60` |
    /// | `RETRIEVAL_LIMIT` | `10` |
    pub fn from_env() -> Self {
        Self {
            free_tier_bytes: parse_var("FREE_TIER_BYTES", DEFAULT_FREE_TIER_BYTES),
            signed_url_expiry: Duration::from_secs(parse_var(
                "SIGNED_URL_EXPIRY_SECONDS",
                DEFAULT_SIGNED_URL_EXPIRY_SECS,
            )),
            rate_limit_per_hour: parse_var("RATE_LIMIT_PER_HOUR", DEFAULT_RATE_LIMIT_PER_HOUR),
            transfer_timeout: Duration::from_secs(parse_var(
                "TRANSFER_TIMEOUT_SECS",
                DEFAULT_TRANSFER_TIMEOUT_SECS,
            )),
            retrieval_limit: parse_var("RETRIEVAL_LIMIT", DEFAULT_RETRIEVAL_LIMIT),
        }
    }
}

fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid {}={:?}, using {}", name, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}
