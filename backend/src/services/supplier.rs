//! Supplier management service

use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{NewSupplier, PaginatedResponse, Pagination, Supplier, SupplierFilter};
use crate::store::{Store, StoreTx, Window};

/// Supplier service for creating, listing and removing suppliers
#[derive(Clone)]
pub struct SupplierService<S: Store> {
    store: S,
}

impl<S: Store> SupplierService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a new supplier
    pub async fn create_supplier(&self, input: NewSupplier) -> AppResult<Supplier> {
        let input = input.normalized();
        input.validate()?;

        let mut tx = self.store.begin().await?;

        if tx.find_supplier_by_email(&input.email).await?.is_some() {
            return Err(AppError::duplicate(
                "email",
                "A supplier with this email already exists.",
            ));
        }
        if tx.find_supplier_by_phone(&input.phone).await?.is_some() {
            return Err(AppError::duplicate(
                "phone",
                "A supplier with this phone already exists.",
            ));
        }

        let supplier = tx.insert_supplier(&input).await?;
        tx.commit().await?;

        tracing::info!(supplier_id = supplier.id, "Supplier created");
        Ok(supplier)
    }

    /// Get supplier by ID
    pub async fn get_supplier(&self, supplier_id: i64) -> AppResult<Supplier> {
        let mut tx = self.store.begin().await?;
        let supplier = tx
            .get_supplier(supplier_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Supplier".to_string()))?;
        tx.commit().await?;
        Ok(supplier)
    }

    /// List suppliers matching the search term, ordered by ID
    pub async fn list_suppliers(
        &self,
        filter: &SupplierFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Supplier>> {
        let mut tx = self.store.begin().await?;
        let total = tx.count_suppliers(filter).await?;
        let meta = pagination.resolve(total);
        let suppliers = tx.fetch_suppliers(filter, Window::page(&meta)).await?;
        tx.commit().await?;

        Ok(PaginatedResponse::new(suppliers, meta))
    }

    /// Delete a supplier together with its products and their history
    pub async fn delete_supplier(&self, supplier_id: i64) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_supplier(supplier_id).await? {
            return Err(AppError::NotFound("Supplier".to_string()));
        }
        tx.commit().await?;

        tracing::info!(supplier_id, "Supplier deleted");
        Ok(())
    }
}
