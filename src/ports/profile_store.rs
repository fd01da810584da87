//! Profile store port.
//!
//! The profile table is the only shared mutable resource in the billing
//! subsystem, so the port exposes one method per reconciliation operation
//! rather than generic save/update: each method maps to a single per-row
//! write, which is the unit of atomicity. Every entry point that may see a
//! user for the first time goes through `ensure_profile`.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::profile::{Profile, SubscriptionState};

/// Port for the persisted profile table.
///
/// All write methods must be idempotent: replaying the same call leaves
/// the stored row in the same state.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Looks up a profile by identity-provider user id.
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError>;

    /// Looks up a profile by linked billing customer id.
    async fn find_by_customer_id(&self, customer_id: &str)
        -> Result<Option<Profile>, DomainError>;

    /// Fetches the profile for a user, creating the default free-tier row
    /// if absent. Safe to race: concurrent callers converge on one row.
    async fn ensure_profile(&self, user_id: &UserId, email: &str)
        -> Result<Profile, DomainError>;

    /// Assigns the billing customer id if the profile has none, and
    /// returns the winning id. A second writer with a different id gets
    /// the stored one back; its own assignment is a no-op.
    async fn link_billing_customer(
        &self,
        user_id: &UserId,
        customer_id: &str,
    ) -> Result<String, DomainError>;

    /// Writes a subscription snapshot onto the profile matched by billing
    /// customer id. Returns false if no profile matched.
    async fn apply_subscription_state(
        &self,
        customer_id: &str,
        state: SubscriptionState,
    ) -> Result<bool, DomainError>;

    /// Marks the profile matched by customer id past due, leaving the tier
    /// untouched. Returns false if no profile matched.
    async fn mark_payment_failed(&self, customer_id: &str) -> Result<bool, DomainError>;

    /// Grants premium access directly on the profile matched by user id
    /// (one-time purchases carry no subscription snapshot).
    async fn grant_premium(&self, user_id: &UserId) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn ProfileStore) {}
    }
}
