//! Supplier models

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::{contains_ignore_case, non_empty};
use crate::validation::{not_blank, phone_number};

/// A supplier providing products
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

/// Input for creating a supplier
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NewSupplier {
    #[validate(
        custom = "not_blank",
        length(max = 100, message = "Ensure this value has at most 100 characters.")
    )]
    pub name: String,

    #[validate(
        custom = "not_blank",
        email(message = "Enter a valid email address.")
    )]
    pub email: String,

    #[validate(custom = "phone_number")]
    pub phone: String,

    #[validate(custom = "not_blank")]
    pub address: String,
}

impl NewSupplier {
    /// Trim surrounding whitespace the way form fields are cleaned
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
        }
    }
}

/// Supplier list filter: case-insensitive substring on name or email
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplierFilter {
    pub search: Option<String>,
}

impl SupplierFilter {
    pub fn new(search: Option<String>) -> Self {
        Self {
            search: non_empty(search),
        }
    }

    pub fn matches(&self, supplier: &Supplier) -> bool {
        match self.search.as_deref() {
            Some(term) => {
                contains_ignore_case(&supplier.name, term)
                    || contains_ignore_case(&supplier.email, term)
            }
            None => true,
        }
    }
}
