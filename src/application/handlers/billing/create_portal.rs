//! CreatePortalHandler - issues a billing portal session for subscription
//! management.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{BillingProvider, PortalSession, ProfileStore};

/// Command to open the billing portal.
#[derive(Debug, Clone)]
pub struct CreatePortalCommand {
    pub user_id: UserId,
}

/// Result carrying the portal redirect.
#[derive(Debug, Clone)]
pub struct CreatePortalResult {
    pub session: PortalSession,
}

/// Handler for creating billing portal sessions.
///
/// Requires an already-linked billing customer: a user who never started a
/// checkout has nothing to manage.
pub struct CreatePortalHandler {
    profiles: Arc<dyn ProfileStore>,
    billing: Arc<dyn BillingProvider>,
    return_url: String,
}

impl CreatePortalHandler {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        billing: Arc<dyn BillingProvider>,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            profiles,
            billing,
            return_url: return_url.into(),
        }
    }

    pub async fn handle(&self, cmd: CreatePortalCommand) -> Result<CreatePortalResult, DomainError> {
        let profile = self
            .profiles
            .find_by_user_id(&cmd.user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Profile"))?;

        let customer_id = profile
            .billing_customer_id
            .ok_or_else(|| DomainError::not_found("Billing customer"))?;

        let session = self
            .billing
            .create_portal_session(&customer_id, &self.return_url)
            .await
            .map_err(DomainError::from)?;

        tracing::info!(user_id = %cmd.user_id, customer_id = %customer_id, "Portal session created");

        Ok(CreatePortalResult { session })
    }
}
