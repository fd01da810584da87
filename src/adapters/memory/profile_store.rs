//! In-memory implementation of ProfileStore.
//!
//! Backs the HTTP integration tests and local development. Mirrors the
//! Postgres adapter's semantics: per-row writes, idempotent customer
//! linking, snapshot updates keyed by customer id.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::profile::{Profile, SubscriptionState};
use crate::ports::ProfileStore;

/// In-process profile table.
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl InMemoryProfileStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with existing profiles (for tests).
    pub fn with_profiles(profiles: impl IntoIterator<Item = Profile>) -> Self {
        let map = profiles
            .into_iter()
            .map(|p| (p.id.as_str().to_string(), p))
            .collect();
        Self {
            profiles: RwLock::new(map),
        }
    }

    /// Number of stored profiles.
    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    /// Whether the store holds no profiles.
    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Profile>, DomainError> {
        Ok(self.profiles.read().await.get(user_id.as_str()).cloned())
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<Profile>, DomainError> {
        Ok(self
            .profiles
            .read()
            .await
            .values()
            .find(|p| p.billing_customer_id.as_deref() == Some(customer_id))
            .cloned())
    }

    async fn ensure_profile(
        &self,
        user_id: &UserId,
        email: &str,
    ) -> Result<Profile, DomainError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .entry(user_id.as_str().to_string())
            .or_insert_with(|| Profile::new_free(user_id.clone(), email, Timestamp::now()));
        Ok(profile.clone())
    }

    async fn link_billing_customer(
        &self,
        user_id: &UserId,
        customer_id: &str,
    ) -> Result<String, DomainError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(user_id.as_str())
            .ok_or_else(|| DomainError::not_found("Profile"))?;
        Ok(profile.link_billing_customer(customer_id, Timestamp::now()))
    }

    async fn apply_subscription_state(
        &self,
        customer_id: &str,
        state: SubscriptionState,
    ) -> Result<bool, DomainError> {
        let mut profiles = self.profiles.write().await;
        match profiles
            .values_mut()
            .find(|p| p.billing_customer_id.as_deref() == Some(customer_id))
        {
            Some(profile) => {
                profile.apply_subscription_state(state, Timestamp::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_payment_failed(&self, customer_id: &str) -> Result<bool, DomainError> {
        let mut profiles = self.profiles.write().await;
        match profiles
            .values_mut()
            .find(|p| p.billing_customer_id.as_deref() == Some(customer_id))
        {
            Some(profile) => {
                profile.mark_payment_failed(Timestamp::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn grant_premium(&self, user_id: &UserId) -> Result<(), DomainError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(user_id.as_str())
            .ok_or_else(|| DomainError::not_found("Profile"))?;
        profile.grant_premium(Timestamp::now());
        Ok(())
    }
}
