//! Axum router configuration for billing endpoints.

use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{
    create_checkout, create_portal, get_subscription, handle_billing_webhook, BillingAppState,
};

/// Create the user-facing billing routes.
///
/// # Routes
///
/// - `POST /checkout` - Start a hosted checkout session (bearer required)
/// - `POST /portal` - Get a billing portal URL (bearer required)
/// - `GET /subscription` - Entitlement query (bearer optional)
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/portal", post(create_portal))
        .route("/subscription", get(get_subscription))
}

/// Create the webhook routes.
///
/// Separate from the user routes: webhooks carry no bearer token and are
/// authenticated by signature instead.
///
/// # Routes
/// - `POST /billing` - Provider webhook deliveries
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/billing", post(handle_billing_webhook))
}

/// CORS layer for browser clients.
///
/// Preflight OPTIONS is answered for every route; the allow-list covers
/// the authorization and signature headers the endpoints read. An empty
/// origin list allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("stripe-signature"),
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
        .max_age(Duration::from_secs(86400));

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        layer.allow_origin(parsed)
    }
}

/// Create the complete billing API router.
///
/// # Example
///
/// ```ignore
/// let app = billing_router(state, cors_layer(&[]));
/// axum::serve(listener, app).await?;
/// ```
pub fn billing_router(state: BillingAppState, cors: CorsLayer) -> Router {
    Router::new()
        .nest("/api/billing", billing_routes())
        .nest("/api/webhooks", webhook_routes())
        .layer(cors)
        .with_state(state)
}
