//! Billing webhook event types.
//!
//! Structures for parsing provider webhook payloads. Only fields relevant
//! to subscription reconciliation are captured; everything else in the
//! provider's event schema is ignored.

use serde::{Deserialize, Serialize};

use super::WebhookError;

/// Webhook event envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingEvent {
    /// Provider-assigned event id (evt_...).
    pub id: String,

    /// Dotted type tag, e.g. "customer.subscription.updated".
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix seconds at which the provider emitted the event.
    pub created: i64,

    /// Event payload wrapper.
    pub data: BillingEventData,

    /// True for live-mode billing, false for the test environment.
    pub livemode: bool,

    /// Provider API version the payload was rendered with.
    pub api_version: Option<String>,
}

/// Payload wrapper inside the envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingEventData {
    /// The affected object; its shape depends on the event type.
    pub object: serde_json::Value,

    /// On update events, the attribute values before the change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<serde_json::Value>,
}

impl BillingEvent {
    /// Parses the event type into a known enum variant.
    pub fn kind(&self) -> BillingEventKind {
        BillingEventKind::from_type(&self.event_type)
    }

    /// Deserializes the data object as the specified payload type.
    pub fn object_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, WebhookError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| {
            WebhookError::ParseError(format!(
                "invalid {} payload: {}",
                self.event_type, e
            ))
        })
    }
}

/// Event types the reconciler dispatches on.
///
/// Everything else maps to `Unknown` and is acknowledged without action so
/// the provider never retry-storms over events we do not handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEventKind {
    /// Hosted checkout finished (subscription or one-time payment).
    CheckoutSessionCompleted,
    /// Subscription was created.
    SubscriptionCreated,
    /// Subscription state changed.
    SubscriptionUpdated,
    /// Subscription ended.
    SubscriptionDeleted,
    /// Recurring invoice paid.
    InvoicePaid,
    /// Recurring invoice payment failed.
    InvoicePaymentFailed,
    /// Unhandled event type.
    Unknown(String),
}

impl BillingEventKind {
    /// Maps the provider's event type string.
    pub fn from_type(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "customer.subscription.created" => Self::SubscriptionCreated,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            "invoice.paid" => Self::InvoicePaid,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            other => Self::Unknown(other.to_string()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Payload objects
// ════════════════════════════════════════════════════════════════════════════════

/// Subscription object carried by `customer.subscription.*` events.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscriptionObject {
    /// Subscription id (sub_...).
    pub id: String,

    /// Owning customer id (cus_...).
    pub customer: String,

    /// Provider status string (active, trialing, past_due, ...).
    pub status: String,

    /// End of the current billing period (Unix timestamp).
    pub current_period_end: Option<i64>,
}

/// Checkout session object carried by `checkout.session.completed`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckoutSessionObject {
    /// Session id (cs_...).
    pub id: String,

    /// Customer the session was created for.
    pub customer: Option<String>,

    /// Checkout mode: "subscription", "payment", or "setup".
    pub mode: String,

    /// Subscription created by the session, for subscription mode.
    pub subscription: Option<String>,

    /// Metadata set when the session was created.
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, String>,
}

/// Invoice object carried by `invoice.*` events.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InvoiceObject {
    /// Invoice id (in_...).
    pub id: String,

    /// Customer the invoice belongs to.
    pub customer: String,

    /// Subscription the invoice bills, absent for one-off invoices.
    pub subscription: Option<String>,
}

/// Builder for creating test BillingEvent instances.
#[cfg(test)]
pub struct BillingEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
    livemode: bool,
}

#[cfg(test)]
impl BillingEventBuilder {
    pub fn new() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "customer.subscription.updated".to_string(),
            created: 1_704_067_200,
            object: serde_json::json!({}),
            livemode: false,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn created(mut self, created: i64) -> Self {
        self.created = created;
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.livemode = livemode;
        self
    }

    pub fn build(self) -> BillingEvent {
        BillingEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: BillingEventData {
                object: self.object,
                previous_attributes: None,
            },
            livemode: self.livemode,
            api_version: Some("2023-10-16".to_string()),
        }
    }
}
