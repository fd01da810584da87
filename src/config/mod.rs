//! Application configuration module
//!
//! Typed configuration read from the environment via the `config` and
//! `dotenvy` crates. Every variable carries the `CASEPREP` prefix with
//! `__` separating nested sections, and each section validates itself
//! before the service starts.
//!
//! # Example
//!
//! ```no_run
//! use caseprep::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server binding to {}", config.server.bind_addr);
//! ```

mod auth;
mod database;
mod error;
mod payment;
mod server;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Top-level configuration for the billing service.
///
/// Built by [`AppConfig::load()`] from the process environment.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings (bind address, environment, CORS)
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL pool settings
    pub database: DatabaseConfig,

    /// Identity-provider JWT verification settings
    pub auth: AuthConfig,

    /// Stripe credentials and redirect URLs
    pub payment: PaymentConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// A `.env` file in the working directory is read first when present,
    /// then `CASEPREP__<SECTION>__<KEY>` variables are deserialized into
    /// the section structs (`CASEPREP__DATABASE__URL`,
    /// `CASEPREP__PAYMENT__STRIPE_API_KEY`, ...).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CASEPREP")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Runs every section's validation checks.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` any section reports.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.payment.validate()?;
        Ok(())
    }

    /// Whether this process serves production traffic.
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
