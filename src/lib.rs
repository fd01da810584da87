//! CasePrep - Subscription billing and entitlement backend.
//!
//! This crate implements the billing subsystem for the CasePrep exam
//! case-study platform: checkout and billing-portal sessions, payment
//! provider webhook reconciliation, and the entitlement query that gates
//! premium content.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
