//! Shared types and models for the inventory and sales platform
//!
//! This crate holds the domain models, the stock ledger rules and input
//! validation used by the backend service.

pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
