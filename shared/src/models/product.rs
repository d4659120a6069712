//! Product catalog models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::types::{contains_ignore_case, non_empty};
use crate::validation::{field_error, not_blank, validate_price, validate_stock_quantity};

/// A product with its cached stock level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Decimal,
    /// Running total of the product's stock ledger
    pub stock_quantity: i32,
    pub supplier_id: i64,
    pub supplier_name: String,
}

/// Input for creating a product
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NewProduct {
    #[validate(
        custom = "not_blank",
        length(max = 100, message = "Ensure this value has at most 100 characters.")
    )]
    pub name: String,

    #[validate(custom = "not_blank")]
    pub description: String,

    #[validate(
        custom = "not_blank",
        length(max = 100, message = "Ensure this value has at most 100 characters.")
    )]
    pub category: String,

    #[validate(required(message = "This field is required."))]
    pub price: Option<Decimal>,

    #[validate(required(message = "This field is required."))]
    pub stock_quantity: Option<i32>,

    #[validate(required(message = "This field is required."))]
    pub supplier_id: Option<i64>,
}

impl NewProduct {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category.trim().to_string(),
            ..self
        }
    }

    /// Run the derived checks together with the money and stock rules
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);

        if let Some(price) = self.price {
            if let Err(message) = validate_price(price) {
                errors.add("price", field_error("price", message));
            }
        }
        if let Some(stock_quantity) = self.stock_quantity {
            if let Err(message) = validate_stock_quantity(stock_quantity) {
                errors.add("stock_quantity", field_error("min_value", message));
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Product filter used by the product list and the stock level check.
/// All criteria are optional and combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the product name
    pub name: Option<String>,
    pub supplier_id: Option<i64>,
    /// Only products with at least this much stock
    pub min_stock: Option<i32>,
}

impl ProductFilter {
    pub fn by_name(name: Option<String>) -> Self {
        Self {
            name: non_empty(name),
            ..Self::default()
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(name) = self.name.as_deref() {
            if !contains_ignore_case(&product.name, name) {
                return false;
            }
        }
        if let Some(supplier_id) = self.supplier_id {
            if product.supplier_id != supplier_id {
                return false;
            }
        }
        if let Some(min_stock) = self.min_stock {
            if product.stock_quantity < min_stock {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, supplier_id: i64, stock_quantity: i32) -> Product {
        Product {
            id: 1,
            name: name.to_string(),
            description: "desc".to_string(),
            category: "cat".to_string(),
            price: Decimal::new(1000, 2),
            stock_quantity,
            supplier_id,
            supplier_name: "Supplier".to_string(),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(ProductFilter::default().matches(&product("Widget", 1, 0)));
    }

    #[test]
    fn test_name_filter_is_case_insensitive() {
        let filter = ProductFilter::by_name(Some("iPHONE".to_string()));
        assert!(filter.matches(&product("Apple iPhone 15", 1, 3)));
        assert!(!filter.matches(&product("Galaxy", 1, 3)));
    }

    #[test]
    fn test_blank_name_filter_is_ignored() {
        let filter = ProductFilter::by_name(Some("   ".to_string()));
        assert_eq!(filter.name, None);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let filter = ProductFilter {
            name: Some("widget".to_string()),
            supplier_id: Some(2),
            min_stock: Some(10),
        };
        assert!(filter.matches(&product("Blue Widget", 2, 10)));
        assert!(!filter.matches(&product("Blue Widget", 1, 10)));
        assert!(!filter.matches(&product("Blue Widget", 2, 9)));
        assert!(!filter.matches(&product("Gadget", 2, 50)));
    }

    fn new_product() -> NewProduct {
        NewProduct {
            name: "Widget".to_string(),
            description: "A widget".to_string(),
            category: "Parts".to_string(),
            price: Some(Decimal::new(1999, 2)),
            stock_quantity: Some(5),
            supplier_id: Some(1),
        }
    }

    #[test]
    fn test_check_accepts_valid_product() {
        assert!(new_product().check().is_ok());
    }

    #[test]
    fn test_check_rejects_negative_price_and_stock() {
        let input = NewProduct {
            price: Some(Decimal::new(-1, 0)),
            stock_quantity: Some(-3),
            ..new_product()
        };
        let errors = input.check().unwrap_err();
        assert_eq!(
            crate::validation::first_field_error(&errors),
            Some(("price".to_string(), "Price cannot be negative.".to_string()))
        );
        assert!(errors.field_errors().contains_key("stock_quantity"));
    }

    #[test]
    fn test_check_reports_alphabetically_first_field() {
        let input = NewProduct {
            category: String::new(),
            price: Some(Decimal::new(1234, 3)),
            ..new_product()
        };
        let errors = input.check().unwrap_err();
        let (field, _) = crate::validation::first_field_error(&errors).unwrap();
        assert_eq!(field, "category");
    }

    #[test]
    fn test_new_product_requires_fields() {
        let input = NewProduct::default();
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        for field in ["name", "description", "category", "price", "stock_quantity", "supplier_id"] {
            assert!(fields.contains_key(field), "missing error for {}", field);
        }
    }
}
