//! Stripe adapter - `BillingProvider` implementation over the Stripe REST
//! API.

mod adapter;
mod types;

pub use adapter::{StripeBillingAdapter, StripeConfig};
