//! Storage layer
//!
//! Every service operation runs against one [`StoreTx`]: it is opened with
//! [`Store::begin`], used for all reads and writes of the operation and then
//! committed. A transaction dropped without [`StoreTx::commit`] is rolled back.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::AppResult;
use crate::models::{
    LedgerEntry, MovementFilter, NewSupplier, OrderStatus, PaginationMeta, Product,
    ProductFilter, SaleOrder, SaleOrderFilter, StockMovement, Supplier, SupplierFilter,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Rows of a list query to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// `None` returns every matching row
    pub limit: Option<u64>,
    pub offset: u64,
}

impl Window {
    pub fn all() -> Self {
        Self {
            limit: None,
            offset: 0,
        }
    }

    pub fn page(meta: &PaginationMeta) -> Self {
        Self {
            limit: Some(meta.limit()),
            offset: meta.offset(),
        }
    }

    /// Apply the window to an already ordered iterator
    pub fn slice<T>(&self, rows: impl Iterator<Item = T>) -> Vec<T> {
        let rows = rows.skip(self.offset as usize);
        match self.limit {
            Some(limit) => rows.take(limit as usize).collect(),
            None => rows.collect(),
        }
    }
}

/// Validated product ready to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub supplier_id: i64,
}

/// Validated sale order ready to be inserted as Pending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub product_id: i64,
    pub quantity: i32,
    pub total_price: Decimal,
}

/// Aggregates over one product's ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerTotals {
    pub total_in: i64,
    pub total_out: i64,
    pub movement_count: i64,
}

/// A storage backend
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Tx: StoreTx;

    /// Open a transaction
    async fn begin(&self) -> AppResult<Self::Tx>;

    /// Whether the backend is reachable
    async fn ping(&self) -> bool;

    /// Short backend name reported by the health check
    fn name(&self) -> &'static str;
}

/// Operations available inside one transaction
#[async_trait]
pub trait StoreTx: Send {
    // Suppliers
    async fn insert_supplier(&mut self, input: &NewSupplier) -> AppResult<Supplier>;
    async fn get_supplier(&mut self, id: i64) -> AppResult<Option<Supplier>>;
    /// Case-insensitive lookup
    async fn find_supplier_by_email(&mut self, email: &str) -> AppResult<Option<Supplier>>;
    async fn find_supplier_by_phone(&mut self, phone: &str) -> AppResult<Option<Supplier>>;
    async fn count_suppliers(&mut self, filter: &SupplierFilter) -> AppResult<u64>;
    async fn fetch_suppliers(
        &mut self,
        filter: &SupplierFilter,
        window: Window,
    ) -> AppResult<Vec<Supplier>>;
    /// Delete a supplier with its products, their movements and orders.
    /// Returns `false` if there was no such supplier.
    async fn delete_supplier(&mut self, id: i64) -> AppResult<bool>;

    // Products
    async fn insert_product(&mut self, draft: &ProductDraft) -> AppResult<Product>;
    async fn get_product(&mut self, id: i64) -> AppResult<Option<Product>>;
    /// Read a product and hold it against concurrent writers until commit
    async fn lock_product(&mut self, id: i64) -> AppResult<Option<Product>>;
    /// Case-insensitive lookup
    async fn find_product_by_name(&mut self, name: &str) -> AppResult<Option<Product>>;
    async fn set_stock_quantity(&mut self, product_id: i64, stock_quantity: i32)
        -> AppResult<()>;
    async fn count_products(&mut self, filter: &ProductFilter) -> AppResult<u64>;
    async fn fetch_products(
        &mut self,
        filter: &ProductFilter,
        window: Window,
    ) -> AppResult<Vec<Product>>;

    // Ledger
    async fn append_movement(&mut self, entry: &LedgerEntry) -> AppResult<StockMovement>;
    async fn count_movements(&mut self, filter: &MovementFilter) -> AppResult<u64>;
    async fn fetch_movements(
        &mut self,
        filter: &MovementFilter,
        window: Window,
    ) -> AppResult<Vec<StockMovement>>;
    async fn ledger_totals(&mut self, product_id: i64) -> AppResult<LedgerTotals>;

    // Sale orders
    async fn insert_sale_order(&mut self, draft: &OrderDraft) -> AppResult<SaleOrder>;
    async fn get_sale_order(&mut self, id: i64) -> AppResult<Option<SaleOrder>>;
    /// Read an order and hold it against concurrent writers until commit
    async fn lock_sale_order(&mut self, id: i64) -> AppResult<Option<SaleOrder>>;
    async fn set_order_status(&mut self, id: i64, status: OrderStatus) -> AppResult<SaleOrder>;
    async fn count_sale_orders(&mut self, filter: &SaleOrderFilter) -> AppResult<u64>;
    async fn fetch_sale_orders(
        &mut self,
        filter: &SaleOrderFilter,
        window: Window,
    ) -> AppResult<Vec<SaleOrder>>;

    /// Make every write of this transaction visible
    async fn commit(self) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Pagination;

    #[test]
    fn test_window_slices_page() {
        let meta = Pagination::from_query(Some("2")).resolve(25);
        let rows = Window::page(&meta).slice(1..=25);
        assert_eq!(rows, (11..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_window_all() {
        assert_eq!(Window::all().slice(1..=3), vec![1, 2, 3]);
    }
}
