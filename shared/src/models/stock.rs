//! Stock ledger models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::{Validate, ValidationErrors};

use crate::types::{contains_ignore_case, non_empty};
use crate::validation::field_error;

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementType {
    In,
    Out,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "In",
            MovementType::Out => "Out",
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" => Ok(MovementType::In),
            "out" => Ok(MovementType::Out),
            _ => Err(format!(
                "Select a valid choice. {} is not one of the available choices.",
                s
            )),
        }
    }
}

/// An immutable ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub movement_type: MovementType,
    pub movement_date: NaiveDate,
    pub notes: String,
    /// Order whose creation or cancellation produced this entry
    pub sale_order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a stock movement.
///
/// `movement_type` stays a string here so an unknown choice is reported
/// against the field instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NewStockMovement {
    #[validate(required(message = "This field is required."))]
    pub product_id: Option<i64>,

    #[validate(required(message = "This field is required."))]
    pub movement_type: Option<String>,

    #[validate(
        required(message = "This field is required."),
        range(min = 1, message = "Quantity must be a positive integer.")
    )]
    pub quantity: Option<i32>,

    pub notes: Option<String>,
}

impl NewStockMovement {
    /// Run the derived checks and resolve the movement direction
    pub fn check(&self) -> Result<MovementType, ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);

        let movement_type = match self.movement_type.as_deref() {
            Some(raw) => match raw.parse::<MovementType>() {
                Ok(movement_type) => Some(movement_type),
                Err(_) => {
                    errors.add(
                        "movement_type",
                        field_error(
                            "invalid_choice",
                            "Select a valid choice. That choice is not one of the available choices.",
                        ),
                    );
                    None
                }
            },
            None => None,
        };

        match movement_type {
            Some(movement_type) if errors.errors().is_empty() => Ok(movement_type),
            _ => Err(errors),
        }
    }

    /// Notes as stored: trimmed, empty when absent
    pub fn notes(&self) -> String {
        self.notes
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    }
}

/// A movement ready to be appended to the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub product_id: i64,
    pub quantity: i32,
    pub movement_type: MovementType,
    pub notes: String,
    pub sale_order_id: Option<i64>,
}

/// Movement list filter: case-insensitive substring on the product name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFilter {
    pub search: Option<String>,
}

impl MovementFilter {
    pub fn new(search: Option<String>) -> Self {
        Self {
            search: non_empty(search),
        }
    }

    pub fn matches(&self, movement: &StockMovement) -> bool {
        match self.search.as_deref() {
            Some(term) => contains_ignore_case(&movement.product_name, term),
            None => true,
        }
    }
}

/// Cached stock compared against the ledger it summarizes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBalance {
    pub product_id: i64,
    pub product_name: String,
    pub stock_quantity: i32,
    pub total_in: i64,
    pub total_out: i64,
    pub net: i64,
    pub movement_count: i64,
    pub consistent: bool,
}

impl LedgerBalance {
    pub fn new(
        product_id: i64,
        product_name: String,
        stock_quantity: i32,
        total_in: i64,
        total_out: i64,
        movement_count: i64,
    ) -> Self {
        let net = total_in - total_out;
        Self {
            product_id,
            product_name,
            stock_quantity,
            total_in,
            total_out,
            net,
            movement_count,
            consistent: net == stock_quantity as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_type_parse() {
        assert_eq!("In".parse::<MovementType>(), Ok(MovementType::In));
        assert_eq!("out".parse::<MovementType>(), Ok(MovementType::Out));
        assert!("Sideways".parse::<MovementType>().is_err());
        assert!("".parse::<MovementType>().is_err());
    }

    #[test]
    fn test_movement_type_serde() {
        assert_eq!(serde_json::to_string(&MovementType::In).unwrap(), "\"In\"");
        assert_eq!(
            serde_json::from_str::<MovementType>("\"Out\"").unwrap(),
            MovementType::Out
        );
    }

    #[test]
    fn test_new_movement_quantity_rules() {
        let mut input = NewStockMovement {
            product_id: Some(1),
            movement_type: Some("In".to_string()),
            quantity: Some(0),
            notes: None,
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("quantity"));

        input.quantity = Some(5);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_check_resolves_movement_type() {
        let input = NewStockMovement {
            product_id: Some(1),
            movement_type: Some("out".to_string()),
            quantity: Some(2),
            notes: Some("  restock  ".to_string()),
        };
        assert_eq!(input.check().unwrap(), MovementType::Out);
        assert_eq!(input.notes(), "restock");
    }

    #[test]
    fn test_check_rejects_unknown_movement_type() {
        let input = NewStockMovement {
            product_id: Some(1),
            movement_type: Some("Sideways".to_string()),
            quantity: Some(2),
            notes: None,
        };
        let errors = input.check().unwrap_err();
        assert!(errors.field_errors().contains_key("movement_type"));
        assert_eq!(input.notes(), "");
    }

    #[test]
    fn test_ledger_balance_consistency() {
        let balance = LedgerBalance::new(1, "Widget".to_string(), 70, 100, 30, 3);
        assert_eq!(balance.net, 70);
        assert!(balance.consistent);

        let drifted = LedgerBalance::new(1, "Widget".to_string(), 71, 100, 30, 3);
        assert!(!drifted.consistent);
    }
}
