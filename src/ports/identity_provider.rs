//! Identity provider port for bearer token resolution.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{DomainError, UserId};

/// Caller identity resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Identity-provider user id.
    pub user_id: UserId,

    /// Email claimed by the token.
    pub email: String,
}

/// Errors from token resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Token malformed, signature invalid, or claims missing.
    #[error("Invalid token")]
    InvalidToken,

    /// Token expired.
    #[error("Token expired")]
    TokenExpired,

    /// Identity provider could not be reached.
    #[error("Identity service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<AuthError> for DomainError {
    fn from(err: AuthError) -> Self {
        DomainError::unauthenticated(err.to_string())
    }
}

/// Port for validating identity-provider bearer tokens.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a bearer token into an authenticated user.
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
