//! Channel address helpers.
//!
//! Twilio addresses WhatsApp users as `whatsapp:+15551234567`. Accounts are
//! keyed by the bare E.164 number; the prefix is re-added when sending.

/// Prefix Twilio uses for WhatsApp addresses.
pub const CHANNEL_PREFIX: &str = "whatsapp:";

/// Strip whitespace and the channel prefix from an address.
pub fn strip_channel(address: &str) -> &str {
    let trimmed = address.trim();
    trimmed.strip_prefix(CHANNEL_PREFIX).unwrap_or(trimmed).trim()
}

/// Format an address for the WhatsApp channel, adding the prefix once.
pub fn to_channel(address: &str) -> String {
    format!("{}{}", CHANNEL_PREFIX, strip_channel(address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix_and_whitespace() {
        assert_eq!(strip_channel(" whatsapp:+2348012345678 "), "+2348012345678");
        assert_eq!(strip_channel("+15551234567"), "+15551234567");
    }

    #[test]
    fn adds_prefix_once() {
        assert_eq!(to_channel("+15551234567"), "whatsapp:+15551234567");
        assert_eq!(to_channel("whatsapp:+15551234567"), "whatsapp:+15551234567");
    }
}
