//! JWT identity provider.
//!
//! Verifies HS256 access tokens issued by the identity provider using the
//! shared signing secret. Only verification happens here; token issuance
//! belongs to the identity provider.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::AuthConfig;
use crate::domain::foundation::UserId;
use crate::ports::{AuthError, AuthenticatedUser, IdentityProvider};

/// Verification settings for identity-provider tokens.
#[derive(Clone)]
pub struct JwtConfig {
    secret: SecretString,
    audience: String,
    issuer: Option<String>,
    leeway_secs: u64,
}

impl JwtConfig {
    /// Creates a config with the shared signing secret and expected
    /// audience.
    pub fn new(secret: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
            audience: audience.into(),
            issuer: None,
            leeway_secs: 30,
        }
    }

    /// Requires a specific issuer claim.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Sets the clock skew tolerance.
    pub fn with_leeway_secs(mut self, secs: u64) -> Self {
        self.leeway_secs = secs;
        self
    }
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        let mut jwt = JwtConfig::new(config.jwt_secret.clone(), config.jwt_audience.clone())
            .with_leeway_secs(config.jwt_leeway_secs);
        if let Some(issuer) = &config.jwt_issuer {
            jwt = jwt.with_issuer(issuer.clone());
        }
        jwt
    }
}

/// Claims we read from identity-provider access tokens.
#[derive(Debug, Deserialize)]
struct Claims {
    /// Identity-provider user id.
    sub: String,
    /// User email.
    email: Option<String>,
}

/// Identity provider backed by HS256 JWT verification.
pub struct JwtIdentityProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    /// Creates a provider from verification settings.
    pub fn new(config: JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.expose_secret().as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.audience.as_str()]);
        validation.leeway = config.leeway_secs;
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }

        Self {
            decoding_key,
            validation,
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        let user_id = UserId::new(data.claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let email = data.claims.email.unwrap_or_default();

        Ok(AuthenticatedUser { user_id, email })
    }
}
