//! Billing domain module.
//!
//! Webhook event envelope and payload types, signature verification, and
//! the webhook error taxonomy. Provider API calls live behind the
//! `BillingProvider` port; this module only understands what the provider
//! sends *to* us.

mod errors;
mod event;
mod signature;

pub use errors::WebhookError;
pub use event::{
    BillingEvent, BillingEventData, BillingEventKind, CheckoutSessionObject, InvoiceObject,
    SubscriptionObject,
};
pub use signature::{SignatureHeader, WebhookVerifier};

#[cfg(test)]
pub use event::BillingEventBuilder;
#[cfg(test)]
pub use signature::compute_test_signature;
