//! Domain models for the inventory and sales platform
//!
//! Re-exports models and pagination types from the shared crate

pub use shared::models::*;
pub use shared::types::{PaginatedResponse, Pagination, PaginationMeta, PAGE_SIZE};
