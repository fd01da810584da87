//! Identity provider adapters.

mod jwt;
mod static_provider;

pub use jwt::{JwtConfig, JwtIdentityProvider};
pub use static_provider::StaticIdentityProvider;
