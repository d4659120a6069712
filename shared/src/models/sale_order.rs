//! Sale order models and status lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

/// Sale order status
///
/// ```text
/// Pending ──complete──▶ Completed
///    │
///    └────cancel─────▶ Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Completed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Completed" => Ok(OrderStatus::Completed),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("Unknown order status: {}", other)),
        }
    }
}

/// Transition requested on a pending order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTransition {
    Complete,
    Cancel,
}

impl OrderTransition {
    pub fn target(&self) -> OrderStatus {
        match self {
            OrderTransition::Complete => OrderStatus::Completed,
            OrderTransition::Cancel => OrderStatus::Cancelled,
        }
    }

    /// Warning reported when the order is not pending
    pub fn rejected_warning(&self) -> &'static str {
        match self {
            OrderTransition::Complete => "Only 'Pending' orders can be completed.",
            OrderTransition::Cancel => "Only 'Pending' orders can be cancelled.",
        }
    }
}

/// A sale order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleOrder {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    /// Price times quantity at creation time, never recomputed
    pub total_price: Decimal,
    pub sale_date: NaiveDate,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for placing a sale order
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NewSaleOrder {
    #[validate(required(message = "This field is required."))]
    pub product_id: Option<i64>,

    #[validate(
        required(message = "This field is required."),
        range(min = 1, message = "Quantity must be at least 1.")
    )]
    pub quantity: Option<i32>,
}

/// Result of a complete/cancel request.
/// A request against a non-pending order is a no-op carrying a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub order: SaleOrder,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl TransitionOutcome {
    pub fn applied(order: SaleOrder) -> Self {
        Self {
            order,
            applied: true,
            warning: None,
        }
    }

    pub fn skipped(order: SaleOrder, transition: OrderTransition) -> Self {
        Self {
            order,
            applied: false,
            warning: Some(transition.rejected_warning().to_string()),
        }
    }
}

/// Sale order list filter: `None` lists every status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaleOrderFilter {
    pub status: Option<OrderStatus>,
}

impl SaleOrderFilter {
    /// Parse the `status` query value. Missing, empty and "All" select every order.
    pub fn parse(status: Option<&str>) -> Result<Self, String> {
        match status.map(str::trim) {
            None | Some("") | Some("All") => Ok(Self { status: None }),
            Some(s) => s
                .parse::<OrderStatus>()
                .map(|status| Self {
                    status: Some(status),
                })
                .map_err(|_| {
                    format!(
                        "Select a valid choice. {} is not one of the available choices.",
                        s
                    )
                }),
        }
    }

    pub fn matches(&self, order: &SaleOrder) -> bool {
        self.status.map_or(true, |status| order.status == status)
    }
}
