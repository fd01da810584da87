//! GetSubscriptionHandler - answers "is this user entitled to premium
//! content".

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::profile::{Entitlement, SubscriptionStatus, SubscriptionTier};
use crate::ports::{AuthenticatedUser, ProfileStore};

/// Read model returned to the client.
///
/// Recomputed on every call; callers re-query on each auth-state
/// transition, so nothing here may be cached.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    pub is_active: bool,
    pub tier: SubscriptionTier,
    pub status: SubscriptionStatus,
    pub end_date: Option<Timestamp>,
}

impl From<Entitlement> for SubscriptionView {
    fn from(e: Entitlement) -> Self {
        Self {
            is_active: e.is_active,
            tier: e.tier,
            status: e.status,
            end_date: e.end_date,
        }
    }
}

/// Handler for the subscription entitlement query.
pub struct GetSubscriptionHandler {
    profiles: Arc<dyn ProfileStore>,
}

impl GetSubscriptionHandler {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    /// Computes the entitlement for the caller.
    ///
    /// Unauthenticated callers are always free tier. Authenticated callers
    /// get a default free-tier profile row created lazily if absent.
    pub async fn handle(
        &self,
        caller: Option<AuthenticatedUser>,
    ) -> Result<SubscriptionView, DomainError> {
        let Some(user) = caller else {
            return Ok(Entitlement::free().into());
        };

        let profile = self
            .profiles
            .ensure_profile(&user.user_id, &user.email)
            .await?;

        Ok(profile.entitlement(Timestamp::now()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryProfileStore;
    use crate::domain::foundation::UserId;
    use crate::domain::profile::SubscriptionState;

    fn caller(id: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: UserId::new(id).unwrap(),
            email: format!("{}@example.com", id),
        }
    }

    #[tokio::test]
    async fn unauthenticated_caller_is_free_tier() {
        let handler = GetSubscriptionHandler::new(Arc::new(InMemoryProfileStore::new()));

        let view = handler.handle(None).await.unwrap();

        assert!(!view.is_active);
        assert_eq!(view.tier, SubscriptionTier::Free);
        assert_eq!(view.status, SubscriptionStatus::None);
        assert!(view.end_date.is_none());
    }

    #[tokio::test]
    async fn new_user_gets_default_profile_row() {
        let profiles = Arc::new(InMemoryProfileStore::new());
        let handler = GetSubscriptionHandler::new(profiles.clone());

        let view = handler.handle(Some(caller("user-1"))).await.unwrap();

        assert!(!view.is_active);
        assert_eq!(view.tier, SubscriptionTier::Free);
        assert_eq!(profiles.len().await, 1);
    }

    #[tokio::test]
    async fn active_subscriber_is_premium() {
        let profiles = Arc::new(InMemoryProfileStore::new());
        let user = caller("user-1");
        profiles
            .ensure_profile(&user.user_id, &user.email)
            .await
            .unwrap();
        profiles
            .link_billing_customer(&user.user_id, "cus_1")
            .await
            .unwrap();
        profiles
            .apply_subscription_state(
                "cus_1",
                SubscriptionState::from_status(
                    SubscriptionStatus::Active,
                    Some(Timestamp::now().add_days(30)),
                ),
            )
            .await
            .unwrap();

        let handler = GetSubscriptionHandler::new(profiles);
        let view = handler.handle(Some(user)).await.unwrap();

        assert!(view.is_active);
        assert_eq!(view.tier, SubscriptionTier::Premium);
    }

    #[tokio::test]
    async fn expired_end_date_overrides_active_status() {
        let profiles = Arc::new(InMemoryProfileStore::new());
        let user = caller("user-1");
        profiles
            .ensure_profile(&user.user_id, &user.email)
            .await
            .unwrap();
        profiles
            .link_billing_customer(&user.user_id, "cus_1")
            .await
            .unwrap();
        profiles
            .apply_subscription_state(
                "cus_1",
                SubscriptionState::from_status(
                    SubscriptionStatus::Active,
                    Some(Timestamp::now().add_days(-1)),
                ),
            )
            .await
            .unwrap();

        let handler = GetSubscriptionHandler::new(profiles);
        let view = handler.handle(Some(user)).await.unwrap();

        assert!(!view.is_active);
        assert_eq!(view.tier, SubscriptionTier::Free);
        // Stored status is reported as-is
        assert_eq!(view.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn view_serializes_camel_case() {
        let view = SubscriptionView::from(Entitlement::free());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["isActive"], false);
        assert_eq!(json["tier"], "free");
        assert_eq!(json["status"], "none");
        assert!(json["endDate"].is_null());
    }
}
