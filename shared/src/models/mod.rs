//! Domain models for the inventory and sales platform

mod product;
mod sale_order;
mod stock;
mod supplier;

pub use product::*;
pub use sale_order::*;
pub use stock::*;
pub use supplier::*;
