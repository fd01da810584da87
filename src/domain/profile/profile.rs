//! Profile aggregate entity.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

use super::{Entitlement, SubscriptionStatus, SubscriptionTier};

/// One row per end user, keyed by the identity-provider user id.
///
/// Created lazily on first authentication or first billing event; never
/// deleted by this subsystem. The billing customer id is assigned once and
/// then immutable (concurrent writers converge on the first value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Identity-provider user id (primary key).
    pub id: UserId,

    /// Email used for billing customer creation.
    pub email: String,

    /// Payment provider customer id, once linked.
    pub billing_customer_id: Option<String>,

    /// Provider-reported subscription status.
    pub subscription_status: SubscriptionStatus,

    /// Access tier derived from the status at the last write.
    pub subscription_tier: SubscriptionTier,

    /// End of the current billing period, if known.
    pub subscription_end_date: Option<Timestamp>,

    /// When the profile row was created.
    pub created_at: Timestamp,

    /// When the profile row was last written.
    pub updated_at: Timestamp,
}

/// Authoritative subscription snapshot taken from one provider event.
///
/// Webhook deliveries are unordered, so each event is applied as a whole
/// snapshot (last write wins) rather than as a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionState {
    pub status: SubscriptionStatus,
    pub tier: SubscriptionTier,
    pub end_date: Option<Timestamp>,
}

impl SubscriptionState {
    /// Builds the stored state for a provider status snapshot, deriving
    /// the tier.
    pub fn from_status(status: SubscriptionStatus, end_date: Option<Timestamp>) -> Self {
        Self {
            status,
            tier: SubscriptionTier::from_status(status),
            end_date,
        }
    }
}

impl Profile {
    /// Creates the default free-tier profile for a user.
    pub fn new_free(id: UserId, email: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id,
            email: email.into(),
            billing_customer_id: None,
            subscription_status: SubscriptionStatus::None,
            subscription_tier: SubscriptionTier::Free,
            subscription_end_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a subscription snapshot from a lifecycle event.
    ///
    /// Idempotent: applying the same snapshot twice leaves the profile in
    /// the same state (only `updated_at` moves).
    pub fn apply_subscription_state(&mut self, state: SubscriptionState, now: Timestamp) {
        self.subscription_status = state.status;
        self.subscription_tier = state.tier;
        self.subscription_end_date = state.end_date;
        self.updated_at = now;
    }

    /// Records a failed payment.
    ///
    /// Only the status moves to `past_due`; the tier is preserved until a
    /// later lifecycle event changes it, so a single failed charge does not
    /// immediately revoke premium access.
    pub fn mark_payment_failed(&mut self, now: Timestamp) {
        self.subscription_status = SubscriptionStatus::PastDue;
        self.updated_at = now;
    }

    /// Grants premium access directly, for completed one-time purchases
    /// that carry no subscription object.
    pub fn grant_premium(&mut self, now: Timestamp) {
        self.subscription_status = SubscriptionStatus::Active;
        self.subscription_tier = SubscriptionTier::Premium;
        self.updated_at = now;
    }

    /// Links the billing customer id, converging with concurrent writers.
    ///
    /// Returns the winning id: the given one if the slot was empty or
    /// already held the same value, otherwise the previously stored id.
    pub fn link_billing_customer(&mut self, customer_id: &str, now: Timestamp) -> String {
        match &self.billing_customer_id {
            Some(existing) if existing != customer_id => existing.clone(),
            _ => {
                self.billing_customer_id = Some(customer_id.to_string());
                self.updated_at = now;
                customer_id.to_string()
            }
        }
    }

    /// Computes the current entitlement.
    pub fn entitlement(&self, now: Timestamp) -> Entitlement {
        Entitlement::compute(self.subscription_status, self.subscription_end_date, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Timestamp {
        Timestamp::from_unix_secs(1_705_276_800)
    }

    fn test_profile() -> Profile {
        Profile::new_free(UserId::new("user-1").unwrap(), "user@example.com", now())
    }

    // ══════════════════════════════════════════════════════════════
    // Creation
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn new_free_profile_starts_without_subscription() {
        let profile = test_profile();

        assert_eq!(profile.subscription_status, SubscriptionStatus::None);
        assert_eq!(profile.subscription_tier, SubscriptionTier::Free);
        assert!(profile.billing_customer_id.is_none());
        assert!(profile.subscription_end_date.is_none());
        assert!(!profile.entitlement(now()).is_active);
    }

    // ══════════════════════════════════════════════════════════════
    // Snapshot application
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn apply_active_snapshot_grants_premium() {
        let mut profile = test_profile();
        let end = now().add_days(30);

        profile.apply_subscription_state(
            SubscriptionState::from_status(SubscriptionStatus::Active, Some(end)),
            now(),
        );

        assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
        assert_eq!(profile.subscription_tier, SubscriptionTier::Premium);
        assert_eq!(profile.subscription_end_date, Some(end));
    }

    #[test]
    fn apply_snapshot_is_idempotent() {
        let mut profile = test_profile();
        let state =
            SubscriptionState::from_status(SubscriptionStatus::Active, Some(now().add_days(30)));

        profile.apply_subscription_state(state, now());
        let after_first = profile.clone();
        profile.apply_subscription_state(state, now());

        assert_eq!(profile, after_first);
    }

    #[test]
    fn apply_canceled_snapshot_revokes_premium() {
        let mut profile = test_profile();
        profile.apply_subscription_state(
            SubscriptionState::from_status(SubscriptionStatus::Active, Some(now().add_days(30))),
            now(),
        );

        profile.apply_subscription_state(
            SubscriptionState::from_status(SubscriptionStatus::Canceled, Some(now())),
            now(),
        );

        assert_eq!(profile.subscription_tier, SubscriptionTier::Free);
        assert!(!profile.entitlement(now()).is_active);
    }

    // ══════════════════════════════════════════════════════════════
    // Payment failure
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn payment_failure_preserves_tier() {
        let mut profile = test_profile();
        profile.apply_subscription_state(
            SubscriptionState::from_status(SubscriptionStatus::Active, Some(now().add_days(30))),
            now(),
        );

        profile.mark_payment_failed(now());

        assert_eq!(profile.subscription_status, SubscriptionStatus::PastDue);
        assert_eq!(profile.subscription_tier, SubscriptionTier::Premium);
    }

    #[test]
    fn tier_changes_on_next_lifecycle_event_after_failure() {
        let mut profile = test_profile();
        profile.apply_subscription_state(
            SubscriptionState::from_status(SubscriptionStatus::Active, Some(now().add_days(30))),
            now(),
        );
        profile.mark_payment_failed(now());

        profile.apply_subscription_state(
            SubscriptionState::from_status(SubscriptionStatus::Canceled, Some(now())),
            now(),
        );

        assert_eq!(profile.subscription_tier, SubscriptionTier::Free);
    }

    // ══════════════════════════════════════════════════════════════
    // Customer linking
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn link_customer_assigns_when_empty() {
        let mut profile = test_profile();
        let winner = profile.link_billing_customer("cus_abc", now());

        assert_eq!(winner, "cus_abc");
        assert_eq!(profile.billing_customer_id.as_deref(), Some("cus_abc"));
    }

    #[test]
    fn link_customer_same_value_is_noop() {
        let mut profile = test_profile();
        profile.link_billing_customer("cus_abc", now());
        let winner = profile.link_billing_customer("cus_abc", now());

        assert_eq!(winner, "cus_abc");
        assert_eq!(profile.billing_customer_id.as_deref(), Some("cus_abc"));
    }

    #[test]
    fn link_customer_keeps_first_writer() {
        let mut profile = test_profile();
        profile.link_billing_customer("cus_first", now());
        let winner = profile.link_billing_customer("cus_second", now());

        assert_eq!(winner, "cus_first");
        assert_eq!(profile.billing_customer_id.as_deref(), Some("cus_first"));
    }

    // ══════════════════════════════════════════════════════════════
    // One-time purchase upgrade
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn grant_premium_upgrades_without_end_date() {
        let mut profile = test_profile();
        profile.grant_premium(now());

        assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
        assert_eq!(profile.subscription_tier, SubscriptionTier::Premium);
        assert!(profile.subscription_end_date.is_none());
        assert!(profile.entitlement(now()).is_active);
    }

    // ══════════════════════════════════════════════════════════════
    // Entitlement invariant (property)
    // ══════════════════════════════════════════════════════════════

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn any_status() -> impl Strategy<Value = SubscriptionStatus> {
            prop_oneof![
                Just(SubscriptionStatus::Active),
                Just(SubscriptionStatus::Trialing),
                Just(SubscriptionStatus::PastDue),
                Just(SubscriptionStatus::Canceled),
                Just(SubscriptionStatus::Incomplete),
                Just(SubscriptionStatus::None),
            ]
        }

        proptest! {
            #[test]
            fn entitlement_active_iff_status_grants_and_not_expired(
                status in any_status(),
                end_offset_days in proptest::option::of(-365i64..365),
            ) {
                let at = Timestamp::from_unix_secs(1_705_276_800);
                let end_date = end_offset_days.map(|d| at.add_days(d));

                let e = Entitlement::compute(status, end_date, at);

                let expired = end_date.map(|end| !end.is_after(&at)).unwrap_or(false);
                let expected = status.grants_premium() && !expired;
                prop_assert_eq!(e.is_active, expected);
                prop_assert_eq!(e.tier == SubscriptionTier::Premium, expected);
            }
        }
    }
}
