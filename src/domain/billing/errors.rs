//! Webhook processing errors.

use thiserror::Error;

/// Errors raised while verifying or applying a webhook event.
///
/// The split matters for the HTTP response: signature and parse failures
/// must be acknowledged with a 4xx that the provider will not retry
/// usefully, while persistence failures must produce a non-2xx so the
/// provider's redelivery becomes our recovery mechanism.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WebhookError {
    /// Signature did not match the raw body.
    #[error("Webhook signature verification failed")]
    InvalidSignature,

    /// Event timestamp is older than the replay window.
    #[error("Webhook event timestamp outside the accepted window")]
    TimestampOutOfRange,

    /// Event timestamp is too far in the future.
    #[error("Webhook event timestamp is in the future")]
    InvalidTimestamp,

    /// Signature header or event payload could not be parsed.
    #[error("Webhook parse error: {0}")]
    ParseError(String),

    /// The profile store rejected a write.
    #[error("Webhook persistence failure: {0}")]
    Persistence(String),

    /// The provider API could not be reached while resolving the event.
    #[error("Billing provider error during webhook processing: {0}")]
    Provider(String),
}

impl WebhookError {
    /// Whether the provider should redeliver the event.
    ///
    /// Only infrastructure failures are worth a retry; an invalid payload
    /// stays invalid forever.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Provider(_))
    }
}
