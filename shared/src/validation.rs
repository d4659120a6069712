//! Validation utilities for the inventory and sales platform
//!
//! Shape checks live on the input types as `validator` attributes. The
//! functions here cover the rules those attributes cannot express and are
//! also called directly by the backend services.

use std::borrow::Cow;

use rust_decimal::Decimal;
use validator::{ValidationError, ValidationErrors};

/// Money columns are `NUMERIC(10, 2)`
pub const PRICE_MAX_DIGITS: u32 = 10;
pub const PRICE_DECIMAL_PLACES: u32 = 2;

pub const REQUIRED_MESSAGE: &str = "This field is required.";

// ============================================================================
// Catalog Validations
// ============================================================================

/// Validate a supplier phone number: exactly 10 ASCII digits
pub fn validate_phone_digits(phone: &str) -> Result<(), &'static str> {
    if phone.chars().count() != 10 {
        return Err("Phone number must be exactly 10 digits.");
    }
    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err("Phone number must contain only digits.");
    }
    Ok(())
}

/// Validate a product price against the money column
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err("Price cannot be negative.");
    }

    let normalized = price.normalize();
    let decimals = normalized.scale();
    let mantissa_digits = count_digits(normalized.mantissa().unsigned_abs());
    let digits = mantissa_digits.max(decimals);

    if digits > PRICE_MAX_DIGITS {
        return Err("Ensure that there are no more than 10 digits in total.");
    }
    if decimals > PRICE_DECIMAL_PLACES {
        return Err("Ensure that there are no more than 2 decimal places.");
    }
    if digits - decimals > PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES {
        return Err("Ensure that there are no more than 8 digits before the decimal point.");
    }
    Ok(())
}

/// Validate an initial stock quantity
pub fn validate_stock_quantity(stock_quantity: i32) -> Result<(), &'static str> {
    if stock_quantity < 0 {
        return Err("Stock quantity cannot be negative.");
    }
    Ok(())
}

/// Validate the minimum stock used by the stock level check
pub fn validate_min_stock(min_stock: i32) -> Result<(), &'static str> {
    if min_stock < 0 {
        return Err("Ensure this value is greater than or equal to 0.");
    }
    Ok(())
}

fn count_digits(mut n: u128) -> u32 {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

// ============================================================================
// `validator` Adapters
// ============================================================================

pub(crate) fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Required text field: must contain something besides whitespace
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(field_error("required", REQUIRED_MESSAGE));
    }
    Ok(())
}

/// Required phone number field
pub fn phone_number(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;
    validate_phone_digits(value).map_err(|message| field_error("phone", message))
}

/// Pick the error to report from a set of field errors.
///
/// Fields are ordered by name so the same input always reports the same
/// field; within a field the first declared rule wins.
pub fn first_field_error(errors: &ValidationErrors) -> Option<(String, String)> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    fields.into_iter().find_map(|(field, errors)| {
        errors.first().map(|error| {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value ({})", error.code));
            (field.to_string(), message)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewSaleOrder, NewSupplier};
    use std::str::FromStr;
    use validator::Validate;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn supplier() -> NewSupplier {
        NewSupplier {
            name: "Test Supplier".to_string(),
            email: "test@supplier.com".to_string(),
            phone: "1234567890".to_string(),
            address: "Test Address".to_string(),
        }
    }

    // ========================================================================
    // Catalog Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_phone_valid() {
        assert!(validate_phone_digits("1234567890").is_ok());
        assert!(validate_phone_digits("0123456789").is_ok());
    }

    #[test]
    fn test_validate_phone_invalid() {
        assert_eq!(
            validate_phone_digits("12345"),
            Err("Phone number must be exactly 10 digits.")
        );
        assert_eq!(
            validate_phone_digits("12345678901"),
            Err("Phone number must be exactly 10 digits.")
        );
        assert_eq!(
            validate_phone_digits("123-456-78"),
            Err("Phone number must contain only digits.")
        );
    }

    #[test]
    fn test_validate_price_valid() {
        assert!(validate_price(dec("0")).is_ok());
        assert!(validate_price(dec("10.00")).is_ok());
        assert!(validate_price(dec("19.9")).is_ok());
        assert!(validate_price(dec("99999999.99")).is_ok());
        assert!(validate_price(dec("12.3400")).is_ok());
    }

    #[test]
    fn test_validate_price_invalid() {
        assert_eq!(validate_price(dec("-0.01")), Err("Price cannot be negative."));
        assert_eq!(
            validate_price(dec("1.234")),
            Err("Ensure that there are no more than 2 decimal places.")
        );
        assert_eq!(
            validate_price(dec("123456789.12")),
            Err("Ensure that there are no more than 10 digits in total.")
        );
        assert_eq!(
            validate_price(dec("123456789")),
            Err("Ensure that there are no more than 8 digits before the decimal point.")
        );
    }

    #[test]
    fn test_validate_stock_quantity() {
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(100).is_ok());
        assert!(validate_stock_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_min_stock() {
        assert!(validate_min_stock(0).is_ok());
        assert!(validate_min_stock(-5).is_err());
    }

    // ========================================================================
    // Input Type Tests
    // ========================================================================

    #[test]
    fn test_valid_supplier_passes() {
        assert!(supplier().validate().is_ok());
    }

    #[test]
    fn test_blank_supplier_name_is_required() {
        let input = NewSupplier {
            name: "   ".to_string(),
            ..supplier()
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(
            first_field_error(&errors),
            Some(("name".to_string(), REQUIRED_MESSAGE.to_string()))
        );
    }

    #[test]
    fn test_supplier_phone_errors() {
        let input = NewSupplier {
            phone: "12345abcde".to_string(),
            ..supplier()
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(
            first_field_error(&errors),
            Some((
                "phone".to_string(),
                "Phone number must contain only digits.".to_string()
            ))
        );
    }

    #[test]
    fn test_supplier_email_format() {
        let input = NewSupplier {
            email: "not-an-email".to_string(),
            ..supplier()
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(
            first_field_error(&errors),
            Some((
                "email".to_string(),
                "Enter a valid email address.".to_string()
            ))
        );
    }

    #[test]
    fn test_supplier_name_too_long() {
        let input = NewSupplier {
            name: "x".repeat(101),
            ..supplier()
        };
        let errors = input.validate().unwrap_err();
        let (field, _) = first_field_error(&errors).unwrap();
        assert_eq!(field, "name");
    }

    #[test]
    fn test_first_field_error_is_deterministic() {
        let input = NewSaleOrder {
            product_id: None,
            quantity: None,
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(
            first_field_error(&errors),
            Some(("product_id".to_string(), REQUIRED_MESSAGE.to_string()))
        );
    }
}
