//! Business logic services for the inventory and sales platform

pub mod product;
pub mod reporting;
pub mod sale_order;
pub mod stock;
pub mod supplier;

pub use product::ProductService;
pub use reporting::ReportingService;
pub use sale_order::SaleOrderService;
pub use stock::StockService;
pub use supplier::SupplierService;
