//! PostgreSQL implementation of ProfileStore.
//!
//! Every operation is a single statement against the `profiles` table, so
//! the row is the unit of atomicity. `ensure_profile` and
//! `link_billing_customer` are written to be raced: conflicting writers
//! converge instead of erroring.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::profile::{
    Profile, SubscriptionState, SubscriptionStatus, SubscriptionTier,
};
use crate::ports::ProfileStore;

/// PostgreSQL implementation of the ProfileStore port.
///
/// Uses sqlx with connection pooling.
pub struct PostgresProfileStore {
    pool: PgPool,
}

impl PostgresProfileStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a profile.
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: String,
    email: String,
    stripe_customer_id: Option<String>,
    subscription_status: String,
    subscription_tier: String,
    subscription_end_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = DomainError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let id = UserId::new(row.id)
            .map_err(|e| DomainError::persistence(format!("Invalid stored user id: {}", e)))?;
        let tier = parse_tier(&row.subscription_tier)?;

        Ok(Profile {
            id,
            email: row.email,
            billing_customer_id: row.stripe_customer_id,
            subscription_status: SubscriptionStatus::from_provider(&row.subscription_status),
            subscription_tier: tier,
            subscription_end_date: row.subscription_end_date.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_tier(s: &str) -> Result<SubscriptionTier, DomainError> {
    SubscriptionTier::parse(s)
        .ok_or_else(|| DomainError::persistence(format!("Invalid tier value: {}", s)))
}

fn db_err(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::persistence(format!("{}: {}", context, e))
}

const SELECT_COLUMNS: &str = "id, email, stripe_customer_id, subscription_status, \
     subscription_tier, subscription_end_date, created_at, updated_at";

#[async_trait]
impl ProfileStore for PostgresProfileStore {
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError> {
        let row: Option<ProfileRow> = sqlx::query_as(&format!(
            "SELECT {} FROM profiles WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to find profile", e))?;

        row.map(Profile::try_from).transpose()
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<Profile>, DomainError> {
        let row: Option<ProfileRow> = sqlx::query_as(&format!(
            "SELECT {} FROM profiles WHERE stripe_customer_id = $1",
            SELECT_COLUMNS
        ))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to find profile by customer", e))?;

        row.map(Profile::try_from).transpose()
    }

    async fn ensure_profile(
        &self,
        user_id: &UserId,
        email: &str,
    ) -> Result<Profile, DomainError> {
        // Lazy creation; a concurrent INSERT simply loses to the existing
        // row and the follow-up SELECT reads whichever row won.
        sqlx::query(
            r#"
            INSERT INTO profiles (id, email, subscription_status, subscription_tier)
            VALUES ($1, $2, 'none', 'free')
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(user_id.as_str())
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to ensure profile", e))?;

        self.find_by_user_id(user_id)
            .await?
            .ok_or_else(|| DomainError::persistence("Profile missing after upsert"))
    }

    async fn link_billing_customer(
        &self,
        user_id: &UserId,
        customer_id: &str,
    ) -> Result<String, DomainError> {
        // Assign only when unset (or already equal); the later SELECT
        // returns the winning id so concurrent creators converge.
        sqlx::query(
            r#"
            UPDATE profiles
            SET stripe_customer_id = $2, updated_at = now()
            WHERE id = $1
              AND (stripe_customer_id IS NULL OR stripe_customer_id = $2)
            "#,
        )
        .bind(user_id.as_str())
        .bind(customer_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to link billing customer", e))?;

        let stored: Option<String> =
            sqlx::query_scalar("SELECT stripe_customer_id FROM profiles WHERE id = $1")
                .bind(user_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_err("Failed to read back billing customer", e))?
                .flatten();

        stored.ok_or_else(|| DomainError::not_found("Profile"))
    }

    async fn apply_subscription_state(
        &self,
        customer_id: &str,
        state: SubscriptionState,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET subscription_status = $2,
                subscription_tier = $3,
                subscription_end_date = $4,
                updated_at = now()
            WHERE stripe_customer_id = $1
            "#,
        )
        .bind(customer_id)
        .bind(state.status.as_str())
        .bind(state.tier.as_str())
        .bind(state.end_date.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to apply subscription state", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_payment_failed(&self, customer_id: &str) -> Result<bool, DomainError> {
        // Status only; the tier column is deliberately untouched.
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET subscription_status = 'past_due', updated_at = now()
            WHERE stripe_customer_id = $1
            "#,
        )
        .bind(customer_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to mark payment failed", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn grant_premium(&self, user_id: &UserId) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE profiles
            SET subscription_status = 'active',
                subscription_tier = 'premium',
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to grant premium", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("Profile"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tier_accepts_stored_values() {
        assert_eq!(parse_tier("free").unwrap(), SubscriptionTier::Free);
        assert_eq!(parse_tier("premium").unwrap(), SubscriptionTier::Premium);
    }

    #[test]
    fn parse_tier_rejects_invalid_values() {
        assert!(parse_tier("gold").is_err());
        assert!(parse_tier("").is_err());
    }

    #[test]
    fn row_converts_to_profile() {
        let row = ProfileRow {
            id: "user-1".to_string(),
            email: "a@b.com".to_string(),
            stripe_customer_id: Some("cus_1".to_string()),
            subscription_status: "active".to_string(),
            subscription_tier: "premium".to_string(),
            subscription_end_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let profile = Profile::try_from(row).unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
        assert_eq!(profile.subscription_tier, SubscriptionTier::Premium);
        assert_eq!(profile.billing_customer_id.as_deref(), Some("cus_1"));
    }

    #[test]
    fn row_with_unknown_status_degrades_to_none() {
        let row = ProfileRow {
            id: "user-1".to_string(),
            email: "a@b.com".to_string(),
            stripe_customer_id: None,
            subscription_status: "paused".to_string(),
            subscription_tier: "free".to_string(),
            subscription_end_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let profile = Profile::try_from(row).unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::None);
    }

    #[test]
    fn row_with_invalid_tier_fails() {
        let row = ProfileRow {
            id: "user-1".to_string(),
            email: "a@b.com".to_string(),
            stripe_customer_id: None,
            subscription_status: "none".to_string(),
            subscription_tier: "platinum".to_string(),
            subscription_end_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(Profile::try_from(row).is_err());
    }
}
