//! Billing HTTP module - endpoints for checkout, portal, entitlement, and
//! webhooks.

mod dto;
mod handlers;
mod routes;

pub use dto::{CheckoutRequest, CheckoutResponse, ErrorResponse, PortalResponse, WebhookAck};
pub use handlers::BillingAppState;
pub use routes::{billing_router, cors_layer};
