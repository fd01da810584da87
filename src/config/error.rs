//! Configuration error types

use thiserror::Error;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration rejected: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors raised by per-section `validate()` checks.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required setting: {0}")]
    MissingRequired(&'static str),

    #[error("Bind address is not a valid host:port")]
    InvalidBindAddress,

    #[error("Request timeout must be between 1 and 300 seconds")]
    TimeoutOutOfRange,

    #[error("Database URL must be a postgres:// or postgresql:// URL")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("JWT secret must be at least 16 bytes in production")]
    JwtSecretTooShort,

    #[error("Stripe API key must start with sk_")]
    InvalidStripeKey,

    #[error("Stripe webhook secret must start with whsec_")]
    InvalidStripeWebhookSecret,

    #[error("Checkout and portal URLs must be absolute http(s) URLs")]
    InvalidCheckoutUrl,
}
