//! Billing provider port for the hosted payment service.
//!
//! Defines the contract for payment provider integrations. Implementations
//! handle customer management, hosted checkout, and the billing portal.
//! Webhook *ingestion* is not part of this port; signature verification is
//! a pure domain concern (`domain::billing::WebhookVerifier`).

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, UserId};

/// Port for payment provider integrations.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Creates a customer in the payment system, tagged with the user id
    /// as metadata so webhooks can be traced back to a profile.
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, BillingError>;

    /// Fetches a customer by provider id, including its metadata.
    ///
    /// Returns `None` for unknown or deleted customers.
    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, BillingError>;

    /// Creates a hosted checkout session for a customer and price.
    ///
    /// Returns the redirect handle; the caller performs the redirect.
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, BillingError>;

    /// Creates a billing portal session for subscription management.
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, BillingError>;
}

/// Request to create a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerRequest {
    /// Internal user id (stored as provider metadata).
    pub user_id: UserId,

    /// Customer email address.
    pub email: String,
}

/// Customer in the payment system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Provider's customer id (cus_...).
    pub id: String,

    /// Customer email.
    pub email: Option<String>,

    /// Custom metadata; carries `user_id` for customers we created.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Customer {
    /// The identity-provider user id recorded at customer creation, if any.
    pub fn user_id(&self) -> Option<&str> {
        self.metadata.get("user_id").map(String::as_str)
    }
}

/// Request to create a checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Provider's customer id.
    pub customer_id: String,

    /// Provider price id selected by the caller.
    pub price_id: String,

    /// URL to redirect after successful checkout.
    pub success_url: String,

    /// URL to redirect after canceled checkout.
    pub cancel_url: String,
}

/// Checkout session redirect handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's session id (cs_...).
    pub id: String,

    /// URL for the customer to complete checkout.
    pub url: String,
}

/// Billing portal session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSession {
    /// Provider's session id.
    pub id: String,

    /// URL for the customer to manage their subscription.
    pub url: String,
}

/// Errors from billing provider operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingError {
    /// Error code for categorization.
    pub code: BillingErrorCode,

    /// Human-readable message (provider message passed through).
    pub message: String,

    /// HTTP status the provider answered with, carried unchanged.
    pub http_status: Option<u16>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl BillingError {
    /// Creates a new billing error.
    pub fn new(code: BillingErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            http_status: None,
            retryable: code.is_retryable(),
        }
    }

    /// Attaches the provider's HTTP status.
    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(BillingErrorCode::Network, message)
    }

    /// Creates a rate-limited error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(BillingErrorCode::RateLimited, message)
    }

    /// Creates a not-found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(BillingErrorCode::NotFound, format!("{} not found", resource))
    }

    /// Creates a generic provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(BillingErrorCode::Provider, message)
    }
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for BillingError {}

impl From<BillingError> for DomainError {
    fn from(err: BillingError) -> Self {
        match err.code {
            BillingErrorCode::NotFound => DomainError::not_found(&err.message),
            _ => DomainError::billing_provider(err.message, err.http_status),
        }
    }
}

/// Billing error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingErrorCode {
    /// Network connectivity issue.
    Network,

    /// Provider rate limit exceeded.
    RateLimited,

    /// Resource not found at the provider.
    NotFound,

    /// Request rejected by the provider.
    InvalidRequest,

    /// Provider API error.
    Provider,
}

impl BillingErrorCode {
    /// Whether this error class is typically transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BillingErrorCode::Network | BillingErrorCode::RateLimited)
    }
}

impl std::fmt::Display for BillingErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BillingErrorCode::Network => "network_error",
            BillingErrorCode::RateLimited => "rate_limited",
            BillingErrorCode::NotFound => "not_found",
            BillingErrorCode::InvalidRequest => "invalid_request",
            BillingErrorCode::Provider => "provider_error",
        };
        write!(f, "{}", s)
    }
}
