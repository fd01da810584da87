//! Subscription status as reported by the payment provider.

use serde::{Deserialize, Serialize};

/// Provider-reported state of a user's subscription.
///
/// Stored verbatim on the profile; tier and entitlement are derived from
/// it. `None` means the user has never had a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is active and paid up.
    Active,
    /// Subscription is in its trial period.
    Trialing,
    /// A payment failed; the provider is retrying.
    PastDue,
    /// Subscription was canceled or ended.
    Canceled,
    /// Initial payment never completed.
    Incomplete,
    /// No subscription on record.
    None,
}

impl SubscriptionStatus {
    /// Parses a provider status string.
    ///
    /// Provider vocabulary outside our enum degrades conservatively:
    /// `incomplete_expired` folds into `incomplete`, `unpaid` into
    /// `canceled`, and anything unrecognized into `none` so a provider-side
    /// addition cannot poison webhook processing.
    pub fn from_provider(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "trialing" => Self::Trialing,
            "past_due" => Self::PastDue,
            "canceled" => Self::Canceled,
            "incomplete" | "incomplete_expired" => Self::Incomplete,
            "unpaid" => Self::Canceled,
            _ => Self::None,
        }
    }

    /// Returns the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Incomplete => "incomplete",
            Self::None => "none",
        }
    }

    /// Whether this status grants premium access (before expiry checks).
    pub fn grants_premium(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
