//! Authentication configuration

use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Authentication configuration (identity-provider JWT)
///
/// The identity provider signs access tokens with a shared HS256 secret;
/// this service only verifies them.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared JWT signing secret
    pub jwt_secret: String,

    /// Expected token audience
    #[serde(default = "default_audience")]
    pub jwt_audience: String,

    /// Expected token issuer (optional; skipped when empty)
    #[serde(default)]
    pub jwt_issuer: Option<String>,

    /// Clock skew tolerance for expiry checks, in seconds
    #[serde(default = "default_leeway")]
    pub jwt_leeway_secs: u64,
}

impl AuthConfig {
    /// Validate authentication configuration
    ///
    /// Production requires a real secret; development tolerates short ones
    /// for local identity-provider emulators.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.jwt_secret.is_empty() {
            return Err(ValidationError::MissingRequired("JWT_SECRET"));
        }
        if *environment == Environment::Production && self.jwt_secret.len() < 16 {
            return Err(ValidationError::JwtSecretTooShort);
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_audience: default_audience(),
            jwt_issuer: None,
            jwt_leeway_secs: default_leeway(),
        }
    }
}

fn default_audience() -> String {
    "authenticated".to_string()
}

fn default_leeway() -> u64 {
    30
}
