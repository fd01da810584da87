//! Webhook signature verification.
//!
//! The provider signs each delivery with HMAC-SHA256 over
//! `<timestamp>.<raw body>` and sends the result in a
//! `t=...,v1=...` header. Verification runs on the exact raw request
//! bytes, before any JSON parsing, and bounds the timestamp to a short
//! window so captured deliveries cannot be replayed later.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::WebhookError;
use super::event::BillingEvent;

type HmacSha256 = Hmac<Sha256>;

/// Oldest event timestamp accepted, relative to now.
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Tolerated clock skew for timestamps ahead of now.
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Decoded `t=...,v1=...[,v0=...]` signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix seconds at which the provider signed the delivery.
    pub timestamp: i64,
    /// Current-scheme HMAC-SHA256 signature.
    pub v1_signature: Vec<u8>,
    /// Legacy-scheme signature, if the provider still sends one.
    pub v0_signature: Option<Vec<u8>>,
}

impl SignatureHeader {
    /// Decodes the signature header.
    ///
    /// Fields other than `t`, `v1`, and `v0` are skipped so a new scheme
    /// version does not break verification of the current one.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::ParseError` when the header is empty, a
    /// field lacks `=`, the timestamp is not an integer, or a signature
    /// value is not hex.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let malformed = |what: &str| WebhookError::ParseError(format!("signature header: {what}"));

        if header.is_empty() {
            return Err(malformed("empty"));
        }

        let mut timestamp = None;
        let mut v1_signature = None;
        let mut v0_signature = None;

        for field in header.split(',') {
            let (key, value) = field
                .split_once('=')
                .ok_or_else(|| malformed("field without '='"))?;
            let value = value.trim();
            match key.trim() {
                "t" => {
                    timestamp =
                        Some(value.parse().map_err(|_| malformed("non-integer timestamp"))?)
                }
                "v1" => {
                    v1_signature = Some(hex_decode(value).ok_or_else(|| malformed("bad v1 hex"))?)
                }
                "v0" => {
                    v0_signature = Some(hex_decode(value).ok_or_else(|| malformed("bad v0 hex"))?)
                }
                _ => {}
            }
        }

        Ok(SignatureHeader {
            timestamp: timestamp.ok_or_else(|| malformed("no timestamp"))?,
            v1_signature: v1_signature.ok_or_else(|| malformed("no v1 signature"))?,
            v0_signature,
        })
    }
}

/// Verifier for webhook deliveries.
pub struct WebhookVerifier {
    /// Signing secret from the provider dashboard (whsec_...).
    secret: SecretString,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }

    /// Verifies a delivery and decodes it into an event.
    ///
    /// Order matters: header decode, timestamp window, signature match,
    /// and only then JSON parsing of the payload.
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` when the HMAC does not match the raw body
    /// - `TimestampOutOfRange` / `InvalidTimestamp` for stale or
    ///   ahead-of-clock deliveries
    /// - `ParseError` for a malformed header or (post-verification) body
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<BillingEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;
        self.check_timestamp_window(header.timestamp)?;

        let expected = self.sign(header.timestamp, payload);
        if !constant_time_eq(&expected, &header.v1_signature) {
            return Err(WebhookError::InvalidSignature);
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))
    }

    fn check_timestamp_window(&self, timestamp: i64) -> Result<(), WebhookError> {
        let age = chrono::Utc::now().timestamp() - timestamp;
        match age {
            a if a > MAX_EVENT_AGE_SECS => Err(WebhookError::TimestampOutOfRange),
            a if a < -MAX_CLOCK_SKEW_SECS => Err(WebhookError::InvalidTimestamp),
            _ => Ok(()),
        }
    }

    /// HMAC-SHA256 over `<timestamp>.<payload>`.
    fn sign(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Constant-time byte comparison, so mismatch position never leaks
/// through response timing.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    hex.as_bytes()
        .chunks(2)
        .map(|pair| {
            let s = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(s, 16).ok()
        })
        .collect()
}

#[cfg(test)]
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Builds a valid `t=...,v1=...` header for test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, timestamp: i64, payload: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    format!(
        "t={},v1={}",
        timestamp,
        hex_encode(&mac.finalize().into_bytes())
    )
}
