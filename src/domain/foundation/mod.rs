//! Foundation - Shared value objects and error types.
//!
//! These types are used across every domain module and carry no I/O.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::UserId;
pub use timestamp::Timestamp;
