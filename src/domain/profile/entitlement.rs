//! Entitlement - the computed premium-access decision.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::{SubscriptionStatus, SubscriptionTier};

/// The answer to "does this user get premium content right now".
///
/// Computed fresh on every read, never stored: a profile whose end date
/// has passed loses access even though its stored status still says
/// `active`, because the revoking webhook may not have arrived yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    /// Whether premium content is accessible.
    pub is_active: bool,
    /// Effective tier after the expiry check.
    pub tier: SubscriptionTier,
    /// Stored subscription status.
    pub status: SubscriptionStatus,
    /// Stored subscription period end, if any.
    pub end_date: Option<Timestamp>,
}

impl Entitlement {
    /// Computes the entitlement from stored state.
    ///
    /// `is_active` holds iff the status grants premium and the end date is
    /// absent or in the future at `now`.
    pub fn compute(
        status: SubscriptionStatus,
        end_date: Option<Timestamp>,
        now: Timestamp,
    ) -> Self {
        let expired = end_date.map(|end| !end.is_after(&now)).unwrap_or(false);
        let is_active = status.grants_premium() && !expired;
        let tier = if is_active {
            SubscriptionTier::Premium
        } else {
            SubscriptionTier::Free
        };
        Self {
            is_active,
            tier,
            status,
            end_date,
        }
    }

    /// The entitlement of an unauthenticated or unknown caller.
    pub fn free() -> Self {
        Self {
            is_active: false,
            tier: SubscriptionTier::Free,
            status: SubscriptionStatus::None,
            end_date: None,
        }
    }
}
