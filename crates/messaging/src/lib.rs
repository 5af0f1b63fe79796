//! Twilio WhatsApp client library.
//!
//! This crate covers the messaging side of the backup gateway:
//!
//! - Sending text and media messages through the Messages API
//! - Downloading media announced by inbound webhooks
//! - Parsing and authenticating inbound webhook requests
//!
//! # Example
//!
//! ```no_run
//! use messaging::{MessagingClient, TwilioConfig};
//!
//! # async fn example() -> Result<(), messaging::MessagingError> {
//! let config = TwilioConfig::from_env()?;
//! let client = MessagingClient::connect(config).await?;
//!
//! let result = client.send_text("+2348012345678", "Hello!").await?;
//! println!("Queued as {}", result.sid);
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod client;
pub mod config;
pub mod error;
pub mod signature;
pub mod types;

pub use address::{strip_channel, to_channel, CHANNEL_PREFIX};
pub use client::MessagingClient;
pub use config::{TwilioConfig, DEFAULT_API_BASE_URL};
pub use error::{MessagingError, Result};
pub use signature::{SignatureValidator, SIGNATURE_HEADER};
pub use types::*;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
