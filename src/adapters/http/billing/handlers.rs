//! HTTP handlers for billing endpoints.
//!
//! These handlers connect axum routes to the application layer handlers.
//! All dependencies arrive through `BillingAppState`; nothing here touches
//! process-global state.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Json, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::billing::{
    CheckoutUrls, CreateCheckoutCommand, CreateCheckoutHandler, CreatePortalCommand,
    CreatePortalHandler, GetSubscriptionHandler, ProcessWebhookHandler,
};
use crate::domain::billing::{WebhookError, WebhookVerifier};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{BillingProvider, IdentityProvider, ProfileStore};

use super::dto::{CheckoutRequest, CheckoutResponse, ErrorResponse, PortalResponse, WebhookAck};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all endpoint dependencies.
///
/// Cloned per request; the Arc-wrapped ports are shared across handlers.
#[derive(Clone)]
pub struct BillingAppState {
    pub profiles: Arc<dyn ProfileStore>,
    pub billing: Arc<dyn BillingProvider>,
    pub identity: Arc<dyn IdentityProvider>,
    pub checkout_urls: CheckoutUrls,
    pub portal_return_url: String,
    pub webhook_secret: String,
}

impl BillingAppState {
    /// Create handlers on demand from the shared state.
    pub fn checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(
            self.profiles.clone(),
            self.billing.clone(),
            self.checkout_urls.clone(),
        )
    }

    pub fn portal_handler(&self) -> CreatePortalHandler {
        CreatePortalHandler::new(
            self.profiles.clone(),
            self.billing.clone(),
            self.portal_return_url.clone(),
        )
    }

    pub fn subscription_handler(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(self.profiles.clone())
    }

    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(
            self.profiles.clone(),
            self.billing.clone(),
            WebhookVerifier::new(self.webhook_secret.clone()),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Bearer token extraction
// ════════════════════════════════════════════════════════════════════════════════

/// Extractor for a required `Authorization: Bearer <token>` header.
///
/// Token *resolution* happens in the handler through the identity port;
/// the extractor only pulls the raw token out of the request.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Extractor for an optional bearer token.
#[derive(Debug, Clone)]
pub struct MaybeBearerToken(pub Option<String>);

fn bearer_from_parts(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

#[async_trait]
impl<S> axum::extract::FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bearer_from_parts(parts)
            .map(BearerToken)
            .ok_or_else(|| ApiError(DomainError::unauthenticated("Missing bearer token")))
    }
}

#[async_trait]
impl<S> axum::extract::FromRequestParts<S> for MaybeBearerToken
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeBearerToken(bearer_from_parts(parts)))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Endpoint handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/billing/checkout - Start a hosted checkout session
pub async fn create_checkout(
    State(state): State<BillingAppState>,
    BearerToken(token): BearerToken,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.identity.resolve(&token).await.map_err(DomainError::from)?;

    let handler = state.checkout_handler();
    let result = handler
        .handle(CreateCheckoutCommand {
            user_id: user.user_id,
            email: user.email,
            price_id: request.price_id,
        })
        .await?;

    let response = CheckoutResponse {
        session: result.session.into(),
    };

    Ok(Json(response))
}

/// POST /api/billing/portal - Get a billing portal URL
pub async fn create_portal(
    State(state): State<BillingAppState>,
    BearerToken(token): BearerToken,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.identity.resolve(&token).await.map_err(DomainError::from)?;

    let handler = state.portal_handler();
    let result = handler
        .handle(CreatePortalCommand {
            user_id: user.user_id,
        })
        .await?;

    let response = PortalResponse {
        url: result.session.url,
    };

    Ok(Json(response))
}

/// GET /api/billing/subscription - Entitlement query
///
/// Unauthenticated callers (no token, or a token the identity provider
/// rejects) get the free-tier answer rather than an error; the client
/// re-issues this query on every auth-state transition.
pub async fn get_subscription(
    State(state): State<BillingAppState>,
    MaybeBearerToken(token): MaybeBearerToken,
) -> Result<impl IntoResponse, ApiError> {
    let caller = match token {
        Some(token) => state.identity.resolve(&token).await.ok(),
        None => None,
    };

    let handler = state.subscription_handler();
    let view = handler.handle(caller).await?;

    Ok(Json(view))
}

/// POST /api/webhooks/billing - Provider webhook deliveries
///
/// The body must stay raw bytes: signature verification covers the exact
/// payload the provider signed.
pub async fn handle_billing_webhook(
    State(state): State<BillingAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            WebhookApiError(WebhookError::ParseError(
                "Missing Stripe-Signature header".to_string(),
            ))
        })?;

    let handler = state.webhook_handler();
    handler.handle(&body, signature).await?;

    Ok(Json(WebhookAck { received: true }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let err = self.0;
        let status = match err.code {
            ErrorCode::Unauthenticated | ErrorCode::InvalidSignature => StatusCode::UNAUTHORIZED,
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            // The provider's own status is carried through unchanged
            ErrorCode::BillingProvider => err
                .provider_status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            ErrorCode::Persistence | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(code = %err.code, message = %err.message, "Request failed");
        } else {
            tracing::debug!(code = %err.code, message = %err.message, "Request rejected");
        }

        let body = ErrorResponse::new(err.code.to_string(), err.message);
        (status, Json(body)).into_response()
    }
}

/// Error adapter for the webhook endpoint.
///
/// Signature and parse failures answer 4xx (the payload can never become
/// valid); store and provider failures answer 5xx so the provider
/// redelivers.
pub struct WebhookApiError(pub WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let err = self.0;
        let (status, code) = match &err {
            WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp => (StatusCode::UNAUTHORIZED, "INVALID_SIGNATURE"),
            WebhookError::ParseError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            WebhookError::Persistence(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
            }
            WebhookError::Provider(_) => (StatusCode::BAD_GATEWAY, "BILLING_PROVIDER_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!(error = %err, "Webhook processing failed; provider will retry");
        } else {
            tracing::warn!(error = %err, "Webhook rejected");
        }

        let body = ErrorResponse::new(code, err.to_string());
        (status, Json(body)).into_response()
    }
}
