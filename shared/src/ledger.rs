//! Stock ledger rules
//!
//! A product's `stock_quantity` is a cached running total of its ledger.
//! Every mutation of that total goes through [`apply_movement`] so that the
//! cached value and the appended movement always agree.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::MovementType;

/// Largest amount that fits the `NUMERIC(10, 2)` money columns (99999999.99)
pub const MAX_MONEY: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Reasons a movement cannot be applied to a product's stock
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Quantity must be a positive integer.")]
    NonPositiveQuantity,

    #[error("Insufficient stock. Currently {available} in stock.")]
    InsufficientStock { available: i32, requested: i32 },

    #[error("Resulting stock quantity is too large.")]
    Overflow,
}

impl MovementType {
    /// Signed stock delta for a movement of `quantity`
    pub fn signed(&self, quantity: i32) -> i64 {
        match self {
            MovementType::In => quantity as i64,
            MovementType::Out => -(quantity as i64),
        }
    }
}

/// Apply a movement to the current stock and return the new stock level.
///
/// Out movements may not take the stock below zero.
pub fn apply_movement(
    stock_quantity: i32,
    movement_type: MovementType,
    quantity: i32,
) -> Result<i32, LedgerError> {
    if quantity <= 0 {
        return Err(LedgerError::NonPositiveQuantity);
    }

    match movement_type {
        MovementType::In => stock_quantity
            .checked_add(quantity)
            .ok_or(LedgerError::Overflow),
        MovementType::Out => {
            if quantity > stock_quantity {
                return Err(LedgerError::InsufficientStock {
                    available: stock_quantity,
                    requested: quantity,
                });
            }
            Ok(stock_quantity - quantity)
        }
    }
}

/// Net quantity of a ledger: sum of In minus sum of Out
pub fn net_quantity<I>(movements: I) -> i64
where
    I: IntoIterator<Item = (MovementType, i32)>,
{
    movements
        .into_iter()
        .map(|(movement_type, quantity)| movement_type.signed(quantity))
        .sum()
}

/// Total price of an order, frozen at creation time.
/// Returns `None` when the total does not fit the money column.
pub fn order_total(unit_price: Decimal, quantity: i32) -> Option<Decimal> {
    let total = unit_price.checked_mul(Decimal::from(quantity))?;
    if total > MAX_MONEY {
        return None;
    }
    Some(total)
}

/// Note recorded on the opening movement of a new product
pub const OPENING_STOCK_NOTE: &str = "Opening stock";

/// Note recorded on the Out movement of a new sale order
pub fn sale_order_note(order_id: i64) -> String {
    format!("Sale Order #{}", order_id)
}

/// Note recorded on the In movement of a cancelled sale order
pub fn cancelled_order_note(order_id: i64) -> String {
    format!("Cancelled Sale Order #{}", order_id)
}
