//! CasePrep billing service entry point.
//!
//! Composition root: loads configuration, connects infrastructure, wires
//! adapters into the app state, and serves the API. All clients are
//! constructed here and injected; nothing lives in module-level globals.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use caseprep::adapters::auth::{JwtConfig, JwtIdentityProvider};
use caseprep::adapters::http::billing::{billing_router, cors_layer, BillingAppState};
use caseprep::adapters::postgres::PostgresProfileStore;
use caseprep::adapters::stripe::{StripeBillingAdapter, StripeConfig};
use caseprep::application::handlers::billing::CheckoutUrls;
use caseprep::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_filter)),
        )
        .init();

    tracing::info!(
        environment = ?config.server.environment,
        stripe_test_mode = config.payment.is_test_mode(),
        "Starting caseprep billing service"
    );

    // Infrastructure
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    // Adapters
    let profiles = Arc::new(PostgresProfileStore::new(pool));
    let billing = Arc::new(StripeBillingAdapter::new(StripeConfig::new(
        config.payment.stripe_api_key.clone(),
    )));
    let identity = Arc::new(JwtIdentityProvider::new(JwtConfig::from(&config.auth)));

    let state = BillingAppState {
        profiles,
        billing,
        identity,
        checkout_urls: CheckoutUrls {
            success_url: config.payment.checkout_success_url.clone(),
            cancel_url: config.payment.checkout_cancel_url.clone(),
        },
        portal_return_url: config.payment.portal_return_url.clone(),
        webhook_secret: config.payment.stripe_webhook_secret.clone(),
    };

    let app = billing_router(state, cors_layer(&config.server.cors_origins_list()))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
