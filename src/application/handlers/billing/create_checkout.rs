//! CreateCheckoutHandler - starts a hosted checkout for an authenticated
//! user.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{BillingProvider, CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest, ProfileStore};

use super::retry::{retry_transient, RetryOutcome, RetryPolicy};

/// Fixed redirect URLs for the hosted checkout page.
#[derive(Debug, Clone)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

/// Command to start a checkout session.
#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    pub user_id: UserId,
    pub email: String,
    pub price_id: String,
}

/// Result of a started checkout.
#[derive(Debug, Clone)]
pub struct CreateCheckoutResult {
    pub session: CheckoutSession,
    pub customer_id: String,
}

/// Handler for starting a hosted checkout.
///
/// Resolves (or lazily creates) the profile, links a billing customer on
/// first use, and requests the redirect session. Safe to race: the store's
/// conditional customer assignment makes concurrent creators converge on
/// one customer id.
pub struct CreateCheckoutHandler {
    profiles: Arc<dyn ProfileStore>,
    billing: Arc<dyn BillingProvider>,
    urls: CheckoutUrls,
    retry_policy: RetryPolicy,
}

impl CreateCheckoutHandler {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        billing: Arc<dyn BillingProvider>,
        urls: CheckoutUrls,
    ) -> Self {
        Self {
            profiles,
            billing,
            urls,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Overrides the retry policy (tests use a sleepless one).
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutCommand,
    ) -> Result<CreateCheckoutResult, DomainError> {
        // 1. Validate the request
        if cmd.price_id.trim().is_empty() {
            return Err(DomainError::validation("priceId is required"));
        }
        if !cmd.email.contains('@') {
            return Err(DomainError::validation("Invalid email address"));
        }

        // 2. Resolve or lazily create the profile
        let profile = self.profiles.ensure_profile(&cmd.user_id, &cmd.email).await?;

        // 3. Resolve or create the billing customer
        let customer_id = match profile.billing_customer_id {
            Some(id) => id,
            None => self.create_and_link_customer(&cmd).await?,
        };

        // 4. Request the redirect session
        let session = self
            .billing
            .create_checkout_session(CreateCheckoutRequest {
                customer_id: customer_id.clone(),
                price_id: cmd.price_id,
                success_url: self.urls.success_url.clone(),
                cancel_url: self.urls.cancel_url.clone(),
            })
            .await
            .map_err(DomainError::from)?;

        tracing::info!(
            user_id = %cmd.user_id,
            customer_id = %customer_id,
            session_id = %session.id,
            "Checkout session created"
        );

        Ok(CreateCheckoutResult {
            session,
            customer_id,
        })
    }

    /// Creates a provider customer (with bounded retry on transient
    /// failures) and links it, returning whichever id won the race.
    async fn create_and_link_customer(
        &self,
        cmd: &CreateCheckoutCommand,
    ) -> Result<String, DomainError> {
        let request = CreateCustomerRequest {
            user_id: cmd.user_id.clone(),
            email: cmd.email.clone(),
        };

        let customer = match retry_transient(self.retry_policy, || {
            let billing = self.billing.clone();
            let request = request.clone();
            async move { billing.create_customer(request).await }
        })
        .await
        {
            RetryOutcome::Succeeded(customer) => customer,
            RetryOutcome::Exhausted(err) | RetryOutcome::Failed(err) => {
                return Err(DomainError::from(err))
            }
        };

        // A concurrent request may have linked a customer first; the store
        // returns the winning id and our create call was wasted work.
        let winner = self
            .profiles
            .link_billing_customer(&cmd.user_id, &customer.id)
            .await?;

        if winner != customer.id {
            tracing::warn!(
                user_id = %cmd.user_id,
                created = %customer.id,
                linked = %winner,
                "Lost customer-creation race; using existing customer"
            );
        }

        Ok(winner)
    }
}
