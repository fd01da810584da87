//! Stripe wire types.
//!
//! These represent Stripe API objects as returned by its REST endpoints.
//! Only the fields we read are captured.

use std::collections::HashMap;

use serde::Deserialize;

/// Stripe Customer object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomer {
    /// Unique customer identifier (cus_...).
    pub id: String,

    /// Customer email address.
    pub email: Option<String>,

    /// Custom metadata attached at creation.
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Present and true when the customer has been deleted.
    #[serde(default)]
    pub deleted: bool,
}

/// Stripe Checkout Session object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    /// Unique session identifier (cs_...).
    pub id: String,

    /// Hosted checkout URL for the customer.
    pub url: Option<String>,
}

/// Stripe Billing Portal Session object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripePortalSession {
    /// Unique session identifier (bps_...).
    pub id: String,

    /// Hosted portal URL for the customer.
    pub url: String,
}

/// Error envelope returned by the Stripe API on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorEnvelope {
    pub error: StripeApiError,
}

/// Error detail inside the Stripe error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeApiError {
    /// Error category (e.g. "rate_limit_error", "invalid_request_error").
    #[serde(rename = "type")]
    pub error_type: Option<String>,

    /// Machine-readable error code.
    pub code: Option<String>,

    /// Human-readable message.
    pub message: Option<String>,
}
