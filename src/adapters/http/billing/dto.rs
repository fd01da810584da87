//! Request and response DTOs for the billing endpoints.
//!
//! Wire shapes use camelCase to match the client.

use serde::{Deserialize, Serialize};

use crate::ports::CheckoutSession;

/// Body of `POST /api/billing/checkout`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Provider price id for the selected plan.
    #[serde(default)]
    pub price_id: String,
}

/// Redirect handle inside the checkout response.
#[derive(Debug, Clone, Serialize)]
pub struct SessionDto {
    pub id: String,
    pub url: String,
}

impl From<CheckoutSession> for SessionDto {
    fn from(session: CheckoutSession) -> Self {
        Self {
            id: session.id,
            url: session.url,
        }
    }
}

/// Response of `POST /api/billing/checkout`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub session: SessionDto,
}

/// Response of `POST /api/billing/portal`.
#[derive(Debug, Clone, Serialize)]
pub struct PortalResponse {
    pub url: String,
}

/// Response of the webhook endpoint on success or ignored events.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// JSON error envelope returned on every failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}
