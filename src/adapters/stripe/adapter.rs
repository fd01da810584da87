//! Stripe billing provider adapter.
//!
//! Implements the `BillingProvider` trait against the Stripe REST API with
//! form-encoded requests. Errors carry Stripe's own HTTP status through
//! unchanged; rate limits and network failures are marked retryable so the
//! application layer can apply its bounded retry.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::ports::{
    BillingError, BillingProvider, CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest,
    Customer, PortalSession,
};

use super::types::{
    StripeCheckoutSession, StripeCustomer, StripeErrorEnvelope, StripePortalSession,
};

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for the Stripe API (default: https://api.stripe.com).
    api_base_url: String,
}

impl StripeConfig {
    /// Creates a new Stripe configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Sets a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Stripe billing provider adapter.
pub struct StripeBillingAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeBillingAdapter {
    /// Creates a new Stripe adapter with the given configuration.
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Issues a form-encoded POST and decodes the success body.
    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, BillingError> {
        let url = format!("{}{}", self.config.api_base_url, path);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(params)
            .send()
            .await
            .map_err(|e| BillingError::network(e.to_string()))?;

        Self::decode_response(response, path).await
    }

    /// Decodes a Stripe response, translating error bodies.
    async fn decode_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        path: &str,
    ) -> Result<T, BillingError> {
        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(|e| {
                BillingError::provider(format!("Failed to parse Stripe response: {}", e))
            });
        }

        let body = response.text().await.unwrap_or_default();
        let detail: Option<StripeErrorEnvelope> = serde_json::from_str(&body).ok();
        let message = detail
            .as_ref()
            .and_then(|d| d.error.message.clone())
            .unwrap_or_else(|| format!("Stripe API error ({})", status));
        let error_type = detail
            .as_ref()
            .and_then(|d| d.error.error_type.as_deref())
            .unwrap_or_default();

        tracing::error!(
            path,
            status = status.as_u16(),
            error_type,
            "Stripe API call failed"
        );

        let err = if status.as_u16() == 429 || error_type == "rate_limit_error" {
            BillingError::rate_limited(message)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            BillingError::not_found("Stripe resource")
        } else {
            BillingError::provider(message)
        };

        Err(err.with_http_status(status.as_u16()))
    }
}

#[async_trait]
impl BillingProvider for StripeBillingAdapter {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, BillingError> {
        let params = vec![
            ("email", request.email.clone()),
            ("metadata[user_id]", request.user_id.to_string()),
        ];

        let customer: StripeCustomer = self.post_form("/v1/customers", &params).await?;

        tracing::info!(customer_id = %customer.id, user_id = %request.user_id, "Created Stripe customer");

        Ok(Customer {
            id: customer.id,
            email: customer.email.or(Some(request.email)),
            metadata: customer.metadata,
        })
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, BillingError> {
        let url = format!("{}/v1/customers/{}", self.config.api_base_url, customer_id);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| BillingError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let customer: StripeCustomer =
            Self::decode_response(response, "/v1/customers/{id}").await?;

        if customer.deleted {
            return Ok(None);
        }

        Ok(Some(Customer {
            id: customer.id,
            email: customer.email,
            metadata: customer.metadata,
        }))
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, BillingError> {
        let params = vec![
            ("mode", "subscription".to_string()),
            ("customer", request.customer_id.clone()),
            ("line_items[0][price]", request.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
            ("automatic_tax[enabled]", "true".to_string()),
            ("allow_promotion_codes", "true".to_string()),
        ];

        let session: StripeCheckoutSession =
            self.post_form("/v1/checkout/sessions", &params).await?;

        // Stripe returns the hosted URL on creation; the fallback covers
        // older API versions that omitted it.
        let url = session
            .url
            .unwrap_or_else(|| format!("https://checkout.stripe.com/c/pay/{}", session.id));

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, BillingError> {
        let params = vec![
            ("customer", customer_id.to_string()),
            ("return_url", return_url.to_string()),
        ];

        let portal: StripePortalSession = self
            .post_form("/v1/billing_portal/sessions", &params)
            .await?;

        Ok(PortalSession {
            id: portal.id,
            url: portal.url,
        })
    }
}
