//! Sale order workflow service
//!
//! Placing an order takes its quantity out of stock and cancelling a pending
//! order puts it back. Both write a ledger movement tagged with the order.

use shared::ledger::{apply_movement, cancelled_order_note, order_total, sale_order_note};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    LedgerEntry, MovementType, NewSaleOrder, OrderTransition, PaginatedResponse, Pagination,
    SaleOrder, SaleOrderFilter, TransitionOutcome,
};
use crate::store::{OrderDraft, Store, StoreTx, Window};

const INSUFFICIENT_STOCK: &str = "Insufficient stock for this product.";
const TOTAL_TOO_LARGE: &str = "Ensure that there are no more than 10 digits in total.";

/// Sale order service
#[derive(Clone)]
pub struct SaleOrderService<S: Store> {
    store: S,
}

impl<S: Store> SaleOrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Place a pending order and deduct its quantity from stock
    pub async fn create_order(&self, input: NewSaleOrder) -> AppResult<SaleOrder> {
        input.validate()?;
        let product_id = input.product_id.unwrap_or_default();
        let quantity = input.quantity.unwrap_or_default();

        let mut tx = self.store.begin().await?;

        let product = tx
            .lock_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let stock_quantity = apply_movement(product.stock_quantity, MovementType::Out, quantity)
            .map_err(|e| AppError::from_ledger(e, Some(INSUFFICIENT_STOCK)))?;

        let total_price = order_total(product.price, quantity)
            .ok_or_else(|| AppError::validation("quantity", TOTAL_TOO_LARGE))?;

        let order = tx
            .insert_sale_order(&OrderDraft {
                product_id: product.id,
                quantity,
                total_price,
            })
            .await?;

        tx.set_stock_quantity(product.id, stock_quantity).await?;
        tx.append_movement(&LedgerEntry {
            product_id: product.id,
            quantity,
            movement_type: MovementType::Out,
            notes: sale_order_note(order.id),
            sale_order_id: Some(order.id),
        })
        .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = order.id,
            product_id = product.id,
            quantity,
            total_price = %total_price,
            stock_quantity,
            "Sale order created"
        );
        Ok(order)
    }

    /// Get sale order by ID
    pub async fn get_order(&self, order_id: i64) -> AppResult<SaleOrder> {
        let mut tx = self.store.begin().await?;
        let order = tx
            .get_sale_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale order".to_string()))?;
        tx.commit().await?;
        Ok(order)
    }

    /// List orders with the given status, newest first
    pub async fn list_orders(
        &self,
        filter: &SaleOrderFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<SaleOrder>> {
        let mut tx = self.store.begin().await?;
        let total = tx.count_sale_orders(filter).await?;
        let meta = pagination.resolve(total);
        let orders = tx.fetch_sale_orders(filter, Window::page(&meta)).await?;
        tx.commit().await?;

        Ok(PaginatedResponse::new(orders, meta))
    }

    /// Mark a pending order as completed. Stock is not touched.
    pub async fn complete_order(&self, order_id: i64) -> AppResult<TransitionOutcome> {
        self.transition(order_id, OrderTransition::Complete).await
    }

    /// Cancel a pending order and restore its quantity to stock
    pub async fn cancel_order(&self, order_id: i64) -> AppResult<TransitionOutcome> {
        self.transition(order_id, OrderTransition::Cancel).await
    }

    async fn transition(
        &self,
        order_id: i64,
        transition: OrderTransition,
    ) -> AppResult<TransitionOutcome> {
        let mut tx = self.store.begin().await?;

        let order = tx
            .lock_sale_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale order".to_string()))?;

        let target = transition.target();
        if !order.status.can_transition_to(target) {
            tracing::warn!(
                order_id,
                status = %order.status,
                "{}",
                transition.rejected_warning()
            );
            return Ok(TransitionOutcome::skipped(order, transition));
        }

        if transition == OrderTransition::Cancel {
            let product = tx
                .lock_product(order.product_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

            let stock_quantity =
                apply_movement(product.stock_quantity, MovementType::In, order.quantity)
                    .map_err(|e| AppError::from_ledger(e, None))?;

            tx.set_stock_quantity(product.id, stock_quantity).await?;
            tx.append_movement(&LedgerEntry {
                product_id: product.id,
                quantity: order.quantity,
                movement_type: MovementType::In,
                notes: cancelled_order_note(order.id),
                sale_order_id: Some(order.id),
            })
            .await?;
        }

        let order = tx.set_order_status(order.id, target).await?;
        tx.commit().await?;

        tracing::info!(order_id, status = %order.status, "Sale order updated");
        Ok(TransitionOutcome::applied(order))
    }
}
