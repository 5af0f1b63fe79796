//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

use blob_store::{S3Config, StoreError};
use messaging::{MessagingError, TwilioConfig};
use orchestrator::PipelineConfig;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DATABASE_URL: &str = "sqlite:wadrive.db?mode=rwc";

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Externally visible base URL, used to rebuild the signed webhook URL.
    pub public_base_url: Option<String>,
    /// Reject webhooks whose signature does not match.
    pub validate_signatures: bool,
    pub twilio: TwilioConfig,
    pub storage: S3Config,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `GATEWAY_ADDR` | Server bind address | `0.0.0.0:$PORT` or `0.0.0.0:3000` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:wadrive.db?mode=rwc` |
    /// | `PUBLIC_BASE_URL` | Public URL the provider calls | (none) |
    /// | `VALIDATE_SIGNATURES` | `false` disables signature checks | `true` |
    ///
    /// Provider, object store and pipeline settings are read by
    /// [`TwilioConfig::from_env`], [`S3Config::from_env`] and
    /// [`PipelineConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = resolve_addr(env::var("GATEWAY_ADDR").ok(), env::var("PORT").ok())?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let validate_signatures = match env::var("VALIDATE_SIGNATURES") {
            Ok(value) => parse_flag(&value)
                .ok_or_else(|| ConfigError::InvalidFlag("VALIDATE_SIGNATURES", value))?,
            Err(_) => true,
        };

        Ok(Self {
            addr,
            database_url,
            public_base_url,
            validate_signatures,
            twilio: TwilioConfig::from_env()?,
            storage: S3Config::from_env()?,
            pipeline: PipelineConfig::from_env(),
        })
    }
}

/// `GATEWAY_ADDR` wins; otherwise bind all interfaces on `PORT`.
fn resolve_addr(addr: Option<String>, port: Option<String>) -> Result<SocketAddr, ConfigError> {
    let raw = match (addr, port) {
        (Some(addr), _) => addr,
        (None, Some(port)) => format!("0.0.0.0:{}", port.trim()),
        (None, None) => DEFAULT_ADDR.to_string(),
    };
    raw.parse().map_err(|_| ConfigError::InvalidAddr(raw))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid bind address: {0}")]
    InvalidAddr(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidFlag(&'static str, String),

    #[error("Messaging configuration: {0}")]
    Messaging(#[from] MessagingError),

    #[error("Storage configuration: {0}")]
    Storage(#[from] StoreError),
}
