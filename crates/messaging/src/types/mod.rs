//! Types for the Twilio messaging API.

mod inbound;
mod send;

pub use inbound::{InboundMedia, InboundMessage, MAX_MEDIA};
pub(crate) use send::ApiErrorBody;
pub use send::{AccountInfo, SendParams, SendResult};
