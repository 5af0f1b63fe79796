//! Webhook request signature validation.
//!
//! Twilio signs each webhook with `X-Twilio-Signature`: the base64 HMAC-SHA1,
//! keyed by the auth token, of the full request URL followed by every POST
//! parameter name and value, sorted by name.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::{MessagingError, Result};

/// HMAC-SHA1 type alias.
type HmacSha1 = Hmac<Sha1>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "X-Twilio-Signature";

/// Computes and checks webhook signatures for one auth token.
#[derive(Clone)]
pub struct SignatureValidator {
    auth_token: String,
}

impl SignatureValidator {
    /// Create a validator for the given auth token.
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
        }
    }

    fn signed_payload(url: &str, params: &[(String, String)]) -> Vec<u8> {
        let mut sorted: Vec<&(String, String)> = params.iter().collect();
        sorted.sort();

        let mut payload = url.to_string();
        for (key, value) in sorted {
            payload.push_str(key);
            payload.push_str(value);
        }
        payload.into_bytes()
    }

    fn mac(&self, url: &str, params: &[(String, String)]) -> Result<HmacSha1> {
        let mut mac = HmacSha1::new_from_slice(self.auth_token.as_bytes())
            .map_err(|e| MessagingError::Config(format!("HMAC key init failed: {e}")))?;
        mac.update(&Self::signed_payload(url, params));
        Ok(mac)
    }

    /// Compute the expected signature for a request.
    pub fn compute(&self, url: &str, params: &[(String, String)]) -> Result<String> {
        let mac = self.mac(url, params)?;
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Check a received signature in constant time.
    pub fn validate(&self, url: &str, params: &[(String, String)], signature: &str) -> bool {
        let Ok(expected) = STANDARD.decode(signature.trim()) else {
            return false;
        };
        match self.mac(url, params) {
            Ok(mac) => mac.verify_slice(&expected).is_ok(),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for SignatureValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureValidator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Vec<(String, String)> {
        vec![
            ("From".to_string(), "whatsapp:+15551234567".to_string()),
            ("Body".to_string(), "storage".to_string()),
            ("NumMedia".to_string(), "0".to_string()),
        ]
    }

    #[test]
    fn computed_signature_validates() {
        let validator = SignatureValidator::new("token");
        let url = "https://example.com/webhook";
        let signature = validator.compute(url, &params()).unwrap();
        assert!(validator.validate(url, &params(), &signature));
    }

    #[test]
    fn parameter_order_does_not_matter() {
        let validator = SignatureValidator::new("token");
        let url = "https://example.com/webhook";
        let mut reversed = params();
        reversed.reverse();
        assert_eq!(
            validator.compute(url, &params()).unwrap(),
            validator.compute(url, &reversed).unwrap()
        );
    }

    #[test]
    fn tampered_requests_are_rejected() {
        let validator = SignatureValidator::new("token");
        let url = "https://example.com/webhook";
        let signature = validator.compute(url, &params()).unwrap();

        let mut tampered = params();
        tampered[1].1 = "delete account".to_string();
        assert!(!validator.validate(url, &tampered, &signature));
        assert!(!validator.validate("https://evil.example/webhook", &params(), &signature));
        assert!(!SignatureValidator::new("other").validate(url, &params(), &signature));
        assert!(!validator.validate(url, &params(), "not base64!"));
    }
}
