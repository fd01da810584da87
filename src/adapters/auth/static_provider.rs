//! Static identity provider for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::ports::{AuthError, AuthenticatedUser, IdentityProvider};

/// Identity provider that resolves tokens from a fixed table.
///
/// Unknown tokens are rejected, which makes the unauthenticated paths
/// testable without real JWTs.
#[derive(Default)]
pub struct StaticIdentityProvider {
    users: HashMap<String, AuthenticatedUser>,
}

impl StaticIdentityProvider {
    /// Creates an empty provider (every token is invalid).
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token that resolves to the given user.
    pub fn with_token(mut self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.users.insert(token.into(), user);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.users
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
