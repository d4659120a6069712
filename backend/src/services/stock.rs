//! Stock ledger service
//!
//! Every manual stock change is a movement: the product row is locked, the
//! signed quantity is applied to its cached stock and the movement is
//! appended, all in one transaction.

use shared::ledger::apply_movement;

use crate::error::{AppError, AppResult};
use crate::models::{
    LedgerEntry, MovementFilter, NewStockMovement, PaginatedResponse, Pagination, StockMovement,
};
use crate::store::{Store, StoreTx, Window};

/// Stock movement service
#[derive(Clone)]
pub struct StockService<S: Store> {
    store: S,
}

impl<S: Store> StockService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record a stock movement and apply it to the product's stock
    pub async fn record_movement(&self, input: NewStockMovement) -> AppResult<StockMovement> {
        let movement_type = input.check()?;
        let product_id = input.product_id.unwrap_or_default();
        let quantity = input.quantity.unwrap_or_default();

        let mut tx = self.store.begin().await?;

        let product = tx
            .lock_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let stock_quantity = apply_movement(product.stock_quantity, movement_type, quantity)
            .map_err(|e| AppError::from_ledger(e, None))?;

        tx.set_stock_quantity(product.id, stock_quantity).await?;
        let movement = tx
            .append_movement(&LedgerEntry {
                product_id: product.id,
                quantity,
                movement_type,
                notes: input.notes(),
                sale_order_id: None,
            })
            .await?;

        tx.commit().await?;

        tracing::info!(
            product_id = product.id,
            movement_id = movement.id,
            movement_type = %movement_type,
            quantity,
            stock_quantity,
            "Stock movement recorded"
        );
        Ok(movement)
    }

    /// List movements, newest first
    pub async fn list_movements(
        &self,
        filter: &MovementFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<StockMovement>> {
        let mut tx = self.store.begin().await?;
        let total = tx.count_movements(filter).await?;
        let meta = pagination.resolve(total);
        let movements = tx.fetch_movements(filter, Window::page(&meta)).await?;
        tx.commit().await?;

        Ok(PaginatedResponse::new(movements, meta))
    }

    /// Every movement matching the filter, newest first, without pagination
    pub async fn all_movements(&self, filter: &MovementFilter) -> AppResult<Vec<StockMovement>> {
        let mut tx = self.store.begin().await?;
        let movements = tx.fetch_movements(filter, Window::all()).await?;
        tx.commit().await?;
        Ok(movements)
    }
}
