//! Subscription tier - the access level derived from subscription status.

use serde::{Deserialize, Serialize};

use super::SubscriptionStatus;

/// Access level for content gating.
///
/// Never set directly by callers: always derived from the subscription
/// status at write time, so replaying the same provider event converges on
/// the same stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    /// Free tier - sample content only.
    Free,
    /// Premium tier - full case-study library.
    Premium,
}

impl SubscriptionTier {
    /// Derives the tier from a subscription status.
    ///
    /// Active or trialing subscriptions are premium; everything else is
    /// free.
    pub fn from_status(status: SubscriptionStatus) -> Self {
        if status.grants_premium() {
            Self::Premium
        } else {
            Self::Free
        }
    }

    /// Returns the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }

    /// Parses the stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Self::Free),
            "premium" => Some(Self::Premium),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
