//! ProcessWebhookHandler - reconciles provider lifecycle events into the
//! profile store.
//!
//! ## Delivery model
//!
//! The provider retries any non-2xx response, so the handler distinguishes
//! three outcomes:
//! - events we applied or deliberately skipped return success;
//! - signature/parse failures return a client error and are never
//!   reprocessed;
//! - store and provider-API failures return a server error so redelivery
//!   becomes the recovery mechanism.
//!
//! ## Ordering
//!
//! `created` and `updated` events for one subscription arrive in no
//! particular order. Every payload is applied as an authoritative snapshot
//! (last write wins), never as a delta, so replays and reordering converge
//! on the same stored state.

use std::sync::Arc;

use crate::domain::billing::{
    BillingEvent, BillingEventKind, CheckoutSessionObject, InvoiceObject, SubscriptionObject,
    WebhookError, WebhookVerifier,
};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::profile::{SubscriptionState, SubscriptionStatus};
use crate::ports::{BillingProvider, Customer, ProfileStore};

/// What the handler did with a verified event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// A profile write happened.
    Applied,
    /// Recognized event, nothing to change.
    Acknowledged,
    /// Unrecognized event type.
    Ignored,
}

/// Handler for provider webhook deliveries.
pub struct ProcessWebhookHandler {
    profiles: Arc<dyn ProfileStore>,
    billing: Arc<dyn BillingProvider>,
    verifier: WebhookVerifier,
}

fn store_err(e: DomainError) -> WebhookError {
    WebhookError::Persistence(e.to_string())
}

impl ProcessWebhookHandler {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        billing: Arc<dyn BillingProvider>,
        verifier: WebhookVerifier,
    ) -> Self {
        Self {
            profiles,
            billing,
            verifier,
        }
    }

    /// Verifies the raw delivery and applies the event.
    pub async fn handle(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookDisposition, WebhookError> {
        // Signature is checked over the exact raw bytes before anything
        // else touches the payload.
        let event = self.verifier.verify_and_parse(payload, signature)?;

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            livemode = event.livemode,
            "Webhook verified"
        );

        let disposition = match event.kind() {
            BillingEventKind::SubscriptionCreated | BillingEventKind::SubscriptionUpdated => {
                self.apply_subscription_snapshot(&event).await?
            }
            BillingEventKind::SubscriptionDeleted => self.apply_subscription_deleted(&event).await?,
            BillingEventKind::InvoicePaid => self.apply_invoice_paid(&event).await?,
            BillingEventKind::InvoicePaymentFailed => {
                self.apply_invoice_payment_failed(&event).await?
            }
            BillingEventKind::CheckoutSessionCompleted => {
                self.apply_checkout_completed(&event).await?
            }
            BillingEventKind::Unknown(other) => {
                tracing::debug!(event_id = %event.id, event_type = %other, "Ignoring unhandled event type");
                WebhookDisposition::Ignored
            }
        };

        Ok(disposition)
    }

    /// `customer.subscription.created` / `customer.subscription.updated`:
    /// write the payload's state onto the matched profile.
    async fn apply_subscription_snapshot(
        &self,
        event: &BillingEvent,
    ) -> Result<WebhookDisposition, WebhookError> {
        let sub: SubscriptionObject = event.object_as()?;
        let state = SubscriptionState::from_status(
            SubscriptionStatus::from_provider(&sub.status),
            sub.current_period_end.map(Timestamp::from_unix_secs),
        );

        self.write_snapshot(&sub.customer, state, event).await
    }

    /// `customer.subscription.deleted`: the subscription is gone, access
    /// ends now.
    async fn apply_subscription_deleted(
        &self,
        event: &BillingEvent,
    ) -> Result<WebhookDisposition, WebhookError> {
        let sub: SubscriptionObject = event.object_as()?;
        let state = SubscriptionState::from_status(
            SubscriptionStatus::Canceled,
            Some(Timestamp::from_unix_secs(event.created)),
        );

        self.write_snapshot(&sub.customer, state, event).await
    }

    /// Applies a snapshot by customer id, creating the profile from
    /// customer metadata when the webhook beat the checkout linkage.
    async fn write_snapshot(
        &self,
        customer_id: &str,
        state: SubscriptionState,
        event: &BillingEvent,
    ) -> Result<WebhookDisposition, WebhookError> {
        let matched = self
            .profiles
            .apply_subscription_state(customer_id, state)
            .await
            .map_err(store_err)?;

        if matched {
            return Ok(WebhookDisposition::Applied);
        }

        // Out-of-order delivery: no profile carries this customer yet.
        // The customer's metadata holds the user id we tagged at creation.
        let Some(user_id) = self.resolve_user_from_customer(customer_id, &event.id).await? else {
            return Ok(WebhookDisposition::Acknowledged);
        };

        let matched = self
            .profiles
            .apply_subscription_state(customer_id, state)
            .await
            .map_err(store_err)?;

        if !matched {
            // ensure + link just succeeded, so the row must exist
            return Err(WebhookError::Persistence(format!(
                "profile for user {} vanished during webhook processing",
                user_id
            )));
        }

        Ok(WebhookDisposition::Applied)
    }

    /// `invoice.paid`: a renewal charge went through. Only subscription
    /// invoices matter; the period end stays whatever the accompanying
    /// subscription.updated snapshot wrote.
    async fn apply_invoice_paid(
        &self,
        event: &BillingEvent,
    ) -> Result<WebhookDisposition, WebhookError> {
        let invoice: InvoiceObject = event.object_as()?;
        if invoice.subscription.is_none() {
            return Ok(WebhookDisposition::Acknowledged);
        }

        let Some(profile) = self
            .profiles
            .find_by_customer_id(&invoice.customer)
            .await
            .map_err(store_err)?
        else {
            tracing::warn!(
                event_id = %event.id,
                customer_id = %invoice.customer,
                "invoice.paid for unknown customer"
            );
            return Ok(WebhookDisposition::Acknowledged);
        };

        let state = SubscriptionState::from_status(
            SubscriptionStatus::Active,
            profile.subscription_end_date,
        );
        self.profiles
            .apply_subscription_state(&invoice.customer, state)
            .await
            .map_err(store_err)?;

        Ok(WebhookDisposition::Applied)
    }

    /// `invoice.payment_failed`: mark past due. The tier stays put until a
    /// later lifecycle event changes it; one failed charge does not revoke
    /// premium access.
    async fn apply_invoice_payment_failed(
        &self,
        event: &BillingEvent,
    ) -> Result<WebhookDisposition, WebhookError> {
        let invoice: InvoiceObject = event.object_as()?;
        if invoice.subscription.is_none() {
            return Ok(WebhookDisposition::Acknowledged);
        }

        let matched = self
            .profiles
            .mark_payment_failed(&invoice.customer)
            .await
            .map_err(store_err)?;

        if !matched {
            tracing::warn!(
                event_id = %event.id,
                customer_id = %invoice.customer,
                "invoice.payment_failed for unknown customer"
            );
            return Ok(WebhookDisposition::Acknowledged);
        }

        Ok(WebhookDisposition::Applied)
    }

    /// `checkout.session.completed`: one-time payments carry no
    /// subscription object, so the user is resolved through the billing
    /// customer's stored metadata and upgraded directly. Subscription-mode
    /// checkouts are reconciled by their subscription events instead.
    async fn apply_checkout_completed(
        &self,
        event: &BillingEvent,
    ) -> Result<WebhookDisposition, WebhookError> {
        let session: CheckoutSessionObject = event.object_as()?;

        if session.mode != "payment" {
            return Ok(WebhookDisposition::Acknowledged);
        }

        let customer_id = session.customer.ok_or_else(|| {
            WebhookError::ParseError("payment-mode session without customer".to_string())
        })?;

        let Some(user_id) = self.resolve_user_from_customer(&customer_id, &event.id).await? else {
            return Ok(WebhookDisposition::Acknowledged);
        };

        self.profiles
            .grant_premium(&user_id)
            .await
            .map_err(store_err)?;

        tracing::info!(
            event_id = %event.id,
            user_id = %user_id,
            customer_id = %customer_id,
            "One-time purchase upgraded profile"
        );

        Ok(WebhookDisposition::Applied)
    }

    /// Fetches the billing customer, reads the user id we tagged at
    /// creation, and ensures a linked profile exists for it.
    ///
    /// Returns `None` (caller acknowledges) when the customer or its
    /// metadata cannot identify a user: redelivering such an event could
    /// never succeed.
    async fn resolve_user_from_customer(
        &self,
        customer_id: &str,
        event_id: &str,
    ) -> Result<Option<UserId>, WebhookError> {
        let customer: Option<Customer> = self
            .billing
            .get_customer(customer_id)
            .await
            .map_err(|e| WebhookError::Provider(e.to_string()))?;

        let Some(customer) = customer else {
            tracing::warn!(event_id, customer_id, "Billing customer not found");
            return Ok(None);
        };

        let Some(user_id) = customer.user_id().and_then(|id| UserId::new(id).ok()) else {
            tracing::warn!(event_id, customer_id, "Billing customer has no user_id metadata");
            return Ok(None);
        };

        let email = customer.email.unwrap_or_default();
        self.profiles
            .ensure_profile(&user_id, &email)
            .await
            .map_err(store_err)?;
        self.profiles
            .link_billing_customer(&user_id, customer_id)
            .await
            .map_err(store_err)?;

        Ok(Some(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryProfileStore;
    use crate::domain::billing::compute_test_signature;
    use crate::domain::profile::{Profile, SubscriptionTier};
    use crate::ports::{
        BillingError, CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest, PortalSession,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    const SECRET: &str = "whsec_handler_test_secret";

    // ══════════════════════════════════════════════════════════════
    // Mocks
    // ══════════════════════════════════════════════════════════════

    /// Provider that serves customers from a fixed table.
    struct MockBillingProvider {
        customers: HashMap<String, Customer>,
    }

    impl MockBillingProvider {
        fn empty() -> Self {
            Self {
                customers: HashMap::new(),
            }
        }

        fn with_customer(customer_id: &str, user_id: &str, email: &str) -> Self {
            let customer = Customer {
                id: customer_id.to_string(),
                email: Some(email.to_string()),
                metadata: HashMap::from([("user_id".to_string(), user_id.to_string())]),
            };
            Self {
                customers: HashMap::from([(customer_id.to_string(), customer)]),
            }
        }
    }

    #[async_trait]
    impl BillingProvider for MockBillingProvider {
        async fn create_customer(
            &self,
            _request: CreateCustomerRequest,
        ) -> Result<Customer, BillingError> {
            unimplemented!("not used by webhook tests")
        }

        async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>, BillingError> {
            Ok(self.customers.get(customer_id).cloned())
        }

        async fn create_checkout_session(
            &self,
            _request: CreateCheckoutRequest,
        ) -> Result<CheckoutSession, BillingError> {
            unimplemented!("not used by webhook tests")
        }

        async fn create_portal_session(
            &self,
            _customer_id: &str,
            _return_url: &str,
        ) -> Result<PortalSession, BillingError> {
            unimplemented!("not used by webhook tests")
        }
    }

    /// Store whose writes always fail, for persistence-error paths.
    struct FailingProfileStore;

    #[async_trait]
    impl ProfileStore for FailingProfileStore {
        async fn find_by_user_id(
            &self,
            _user_id: &UserId,
        ) -> Result<Option<Profile>, DomainError> {
            Err(DomainError::persistence("db down"))
        }

        async fn find_by_customer_id(
            &self,
            _customer_id: &str,
        ) -> Result<Option<Profile>, DomainError> {
            Err(DomainError::persistence("db down"))
        }

        async fn ensure_profile(
            &self,
            _user_id: &UserId,
            _email: &str,
        ) -> Result<Profile, DomainError> {
            Err(DomainError::persistence("db down"))
        }

        async fn link_billing_customer(
            &self,
            _user_id: &UserId,
            _customer_id: &str,
        ) -> Result<String, DomainError> {
            Err(DomainError::persistence("db down"))
        }

        async fn apply_subscription_state(
            &self,
            _customer_id: &str,
            _state: SubscriptionState,
        ) -> Result<bool, DomainError> {
            Err(DomainError::persistence("db down"))
        }

        async fn mark_payment_failed(&self, _customer_id: &str) -> Result<bool, DomainError> {
            Err(DomainError::persistence("db down"))
        }

        async fn grant_premium(&self, _user_id: &UserId) -> Result<(), DomainError> {
            Err(DomainError::persistence("db down"))
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Test helpers
    // ══════════════════════════════════════════════════════════════

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    async fn linked_store() -> Arc<InMemoryProfileStore> {
        let store = Arc::new(InMemoryProfileStore::new());
        store.ensure_profile(&user(), "user@example.com").await.unwrap();
        store.link_billing_customer(&user(), "cus_1").await.unwrap();
        store
    }

    fn handler(
        profiles: Arc<dyn ProfileStore>,
        billing: Arc<dyn BillingProvider>,
    ) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(profiles, billing, WebhookVerifier::new(SECRET))
    }

    /// Serializes an event body and signs it with the test secret.
    fn signed(body: &serde_json::Value) -> (Vec<u8>, String) {
        let payload = serde_json::to_string(body).unwrap();
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(SECRET, timestamp, &payload);
        (payload.into_bytes(), signature)
    }

    fn subscription_event(event_type: &str, status: &str, period_end: i64) -> serde_json::Value {
        json!({
            "id": format!("evt_{}", status),
            "type": event_type,
            "created": chrono::Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "sub_1",
                    "customer": "cus_1",
                    "status": status,
                    "current_period_end": period_end
                }
            },
            "livemode": false
        })
    }

    fn invoice_event(event_type: &str, subscription: Option<&str>) -> serde_json::Value {
        json!({
            "id": "evt_invoice",
            "type": event_type,
            "created": chrono::Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "in_1",
                    "customer": "cus_1",
                    "subscription": subscription
                }
            },
            "livemode": false
        })
    }

    // ══════════════════════════════════════════════════════════════
    // Subscription lifecycle
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn subscription_updated_applies_snapshot() {
        let store = linked_store().await;
        let handler = handler(store.clone(), Arc::new(MockBillingProvider::empty()));
        let period_end = chrono::Utc::now().timestamp() + 86400 * 30;
        let (payload, sig) = signed(&subscription_event(
            "customer.subscription.updated",
            "active",
            period_end,
        ));

        let disposition = handler.handle(&payload, &sig).await.unwrap();

        assert_eq!(disposition, WebhookDisposition::Applied);
        let profile = store.find_by_user_id(&user()).await.unwrap().unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
        assert_eq!(profile.subscription_tier, SubscriptionTier::Premium);
        assert_eq!(
            profile.subscription_end_date.unwrap().as_unix_secs(),
            period_end
        );
    }

    #[tokio::test]
    async fn replaying_same_event_leaves_state_unchanged() {
        let store = linked_store().await;
        let handler = handler(store.clone(), Arc::new(MockBillingProvider::empty()));
        let period_end = chrono::Utc::now().timestamp() + 86400 * 30;
        let body = subscription_event("customer.subscription.updated", "active", period_end);

        let (payload, sig) = signed(&body);
        handler.handle(&payload, &sig).await.unwrap();
        let first = store.find_by_user_id(&user()).await.unwrap().unwrap();

        let (payload, sig) = signed(&body);
        handler.handle(&payload, &sig).await.unwrap();
        let second = store.find_by_user_id(&user()).await.unwrap().unwrap();

        assert_eq!(first.subscription_status, second.subscription_status);
        assert_eq!(first.subscription_tier, second.subscription_tier);
        assert_eq!(first.subscription_end_date, second.subscription_end_date);
    }

    #[tokio::test]
    async fn trialing_snapshot_grants_premium() {
        let store = linked_store().await;
        let handler = handler(store.clone(), Arc::new(MockBillingProvider::empty()));
        let (payload, sig) = signed(&subscription_event(
            "customer.subscription.created",
            "trialing",
            chrono::Utc::now().timestamp() + 86400 * 7,
        ));

        handler.handle(&payload, &sig).await.unwrap();

        let profile = store.find_by_user_id(&user()).await.unwrap().unwrap();
        assert_eq!(profile.subscription_tier, SubscriptionTier::Premium);
    }

    #[tokio::test]
    async fn subscription_deleted_cancels_with_event_time() {
        let store = linked_store().await;
        let handler = handler(store.clone(), Arc::new(MockBillingProvider::empty()));
        let created = chrono::Utc::now().timestamp();
        let (payload, sig) = signed(&json!({
            "id": "evt_del",
            "type": "customer.subscription.deleted",
            "created": created,
            "data": {
                "object": {
                    "id": "sub_1",
                    "customer": "cus_1",
                    "status": "canceled"
                }
            },
            "livemode": false
        }));

        let disposition = handler.handle(&payload, &sig).await.unwrap();

        assert_eq!(disposition, WebhookDisposition::Applied);
        let profile = store.find_by_user_id(&user()).await.unwrap().unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::Canceled);
        assert_eq!(profile.subscription_tier, SubscriptionTier::Free);
        assert_eq!(
            profile.subscription_end_date.unwrap().as_unix_secs(),
            created
        );
    }

    #[tokio::test]
    async fn webhook_before_checkout_creates_profile_from_metadata() {
        // No profile exists yet; the provider knows the customer.
        let store = Arc::new(InMemoryProfileStore::new());
        let billing = Arc::new(MockBillingProvider::with_customer(
            "cus_1",
            "user-1",
            "user@example.com",
        ));
        let handler = handler(store.clone(), billing);
        let (payload, sig) = signed(&subscription_event(
            "customer.subscription.created",
            "active",
            chrono::Utc::now().timestamp() + 86400 * 30,
        ));

        let disposition = handler.handle(&payload, &sig).await.unwrap();

        assert_eq!(disposition, WebhookDisposition::Applied);
        let profile = store.find_by_user_id(&user()).await.unwrap().unwrap();
        assert_eq!(profile.billing_customer_id.as_deref(), Some("cus_1"));
        assert_eq!(profile.subscription_tier, SubscriptionTier::Premium);
    }

    #[tokio::test]
    async fn unknown_customer_without_metadata_is_acknowledged() {
        let store = Arc::new(InMemoryProfileStore::new());
        let handler = handler(store.clone(), Arc::new(MockBillingProvider::empty()));
        let (payload, sig) = signed(&subscription_event(
            "customer.subscription.updated",
            "active",
            chrono::Utc::now().timestamp() + 86400,
        ));

        let disposition = handler.handle(&payload, &sig).await.unwrap();

        assert_eq!(disposition, WebhookDisposition::Acknowledged);
        assert!(store.is_empty().await);
    }

    // ══════════════════════════════════════════════════════════════
    // Invoices
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn invoice_paid_reactivates_and_keeps_end_date() {
        let store = linked_store().await;
        let end = Timestamp::now().add_days(30);
        store
            .apply_subscription_state(
                "cus_1",
                SubscriptionState::from_status(SubscriptionStatus::PastDue, Some(end)),
            )
            .await
            .unwrap();

        let handler = handler(store.clone(), Arc::new(MockBillingProvider::empty()));
        let (payload, sig) = signed(&invoice_event("invoice.paid", Some("sub_1")));

        let disposition = handler.handle(&payload, &sig).await.unwrap();

        assert_eq!(disposition, WebhookDisposition::Applied);
        let profile = store.find_by_user_id(&user()).await.unwrap().unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
        assert_eq!(profile.subscription_tier, SubscriptionTier::Premium);
        assert_eq!(profile.subscription_end_date, Some(end));
    }

    #[tokio::test]
    async fn one_off_invoice_paid_is_acknowledged() {
        let store = linked_store().await;
        let handler = handler(store.clone(), Arc::new(MockBillingProvider::empty()));
        let (payload, sig) = signed(&invoice_event("invoice.paid", None));

        let disposition = handler.handle(&payload, &sig).await.unwrap();

        assert_eq!(disposition, WebhookDisposition::Acknowledged);
        let profile = store.find_by_user_id(&user()).await.unwrap().unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::None);
    }

    #[tokio::test]
    async fn payment_failure_sets_past_due_and_preserves_tier() {
        let store = linked_store().await;
        store
            .apply_subscription_state(
                "cus_1",
                SubscriptionState::from_status(
                    SubscriptionStatus::Active,
                    Some(Timestamp::now().add_days(30)),
                ),
            )
            .await
            .unwrap();

        let handler = handler(store.clone(), Arc::new(MockBillingProvider::empty()));
        let (payload, sig) = signed(&invoice_event("invoice.payment_failed", Some("sub_1")));

        let disposition = handler.handle(&payload, &sig).await.unwrap();

        assert_eq!(disposition, WebhookDisposition::Applied);
        let profile = store.find_by_user_id(&user()).await.unwrap().unwrap();
        assert_eq!(profile.subscription_status, SubscriptionStatus::PastDue);
        // A failed payment alone does not revoke premium
        assert_eq!(profile.subscription_tier, SubscriptionTier::Premium);
    }

    // ══════════════════════════════════════════════════════════════
    // Checkout completion
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn one_time_payment_checkout_upgrades_via_metadata() {
        let store = Arc::new(InMemoryProfileStore::new());
        let billing = Arc::new(MockBillingProvider::with_customer(
            "cus_1",
            "user-1",
            "user@example.com",
        ));
        let handler = handler(store.clone(), billing);
        let (payload, sig) = signed(&json!({
            "id": "evt_checkout",
            "type": "checkout.session.completed",
            "created": chrono::Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "cs_1",
                    "customer": "cus_1",
                    "mode": "payment",
                    "subscription": null,
                    "metadata": {}
                }
            },
            "livemode": false
        }));

        let disposition = handler.handle(&payload, &sig).await.unwrap();

        assert_eq!(disposition, WebhookDisposition::Applied);
        let profile = store.find_by_user_id(&user()).await.unwrap().unwrap();
        assert_eq!(profile.billing_customer_id.as_deref(), Some("cus_1"));
        assert_eq!(profile.subscription_tier, SubscriptionTier::Premium);
        assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn subscription_mode_checkout_is_acknowledged() {
        let store = Arc::new(InMemoryProfileStore::new());
        let handler = handler(store.clone(), Arc::new(MockBillingProvider::empty()));
        let (payload, sig) = signed(&json!({
            "id": "evt_checkout_sub",
            "type": "checkout.session.completed",
            "created": chrono::Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "cs_1",
                    "customer": "cus_1",
                    "mode": "subscription",
                    "subscription": "sub_1"
                }
            },
            "livemode": false
        }));

        let disposition = handler.handle(&payload, &sig).await.unwrap();

        assert_eq!(disposition, WebhookDisposition::Acknowledged);
        assert!(store.is_empty().await);
    }

    // ══════════════════════════════════════════════════════════════
    // Dispatch edges
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn unknown_event_type_is_ignored() {
        let store = Arc::new(InMemoryProfileStore::new());
        let handler = handler(store.clone(), Arc::new(MockBillingProvider::empty()));
        let (payload, sig) = signed(&json!({
            "id": "evt_unknown",
            "type": "charge.refunded",
            "created": chrono::Utc::now().timestamp(),
            "data": {"object": {"id": "ch_1"}},
            "livemode": false
        }));

        let disposition = handler.handle(&payload, &sig).await.unwrap();

        assert_eq!(disposition, WebhookDisposition::Ignored);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn invalid_signature_writes_nothing() {
        let store = Arc::new(InMemoryProfileStore::new());
        let handler = handler(store.clone(), Arc::new(MockBillingProvider::empty()));
        let payload = serde_json::to_vec(&subscription_event(
            "customer.subscription.updated",
            "active",
            chrono::Utc::now().timestamp() + 86400,
        ))
        .unwrap();
        let bad_sig = format!("t={},v1={}", chrono::Utc::now().timestamp(), "a".repeat(64));

        let result = handler.handle(&payload, &bad_sig).await;

        assert_eq!(result.unwrap_err(), WebhookError::InvalidSignature);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_retryable_persistence_error() {
        let handler = handler(
            Arc::new(FailingProfileStore),
            Arc::new(MockBillingProvider::empty()),
        );
        let (payload, sig) = signed(&subscription_event(
            "customer.subscription.updated",
            "active",
            chrono::Utc::now().timestamp() + 86400,
        ));

        let err = handler.handle(&payload, &sig).await.unwrap_err();

        assert!(matches!(err, WebhookError::Persistence(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn malformed_subscription_payload_is_parse_error() {
        let store = Arc::new(InMemoryProfileStore::new());
        let handler = handler(store, Arc::new(MockBillingProvider::empty()));
        let (payload, sig) = signed(&json!({
            "id": "evt_bad",
            "type": "customer.subscription.updated",
            "created": chrono::Utc::now().timestamp(),
            "data": {"object": {"unexpected": true}},
            "livemode": false
        }));

        let err = handler.handle(&payload, &sig).await.unwrap_err();

        assert!(matches!(err, WebhookError::ParseError(_)));
        assert!(!err.is_retryable());
    }
}
