//! Product catalog service
//!
//! Covers product creation, the product list, the stock level check and the
//! ledger audit of a single product.

use shared::ledger::OPENING_STOCK_NOTE;

use crate::error::{AppError, AppResult};
use crate::models::{
    LedgerBalance, LedgerEntry, MovementType, NewProduct, PaginatedResponse, Pagination, Product,
    ProductFilter,
};
use crate::store::{ProductDraft, Store, StoreTx, Window};

const UNKNOWN_SUPPLIER: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Product service
#[derive(Clone)]
pub struct ProductService<S: Store> {
    store: S,
}

impl<S: Store> ProductService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a product.
    ///
    /// A positive initial stock is recorded as an opening In movement in the
    /// same transaction, so the product's ledger always sums to its stock.
    pub async fn create_product(&self, input: NewProduct) -> AppResult<Product> {
        let input = input.normalized();
        input.check()?;

        let draft = ProductDraft {
            price: input.price.unwrap_or_default(),
            stock_quantity: input.stock_quantity.unwrap_or_default(),
            supplier_id: input.supplier_id.unwrap_or_default(),
            name: input.name,
            description: input.description,
            category: input.category,
        };

        let mut tx = self.store.begin().await?;

        if tx.find_product_by_name(&draft.name).await?.is_some() {
            return Err(AppError::duplicate(
                "name",
                "A product with this name already exists.",
            ));
        }
        if tx.get_supplier(draft.supplier_id).await?.is_none() {
            return Err(AppError::validation("supplier_id", UNKNOWN_SUPPLIER));
        }

        let product = tx.insert_product(&draft).await?;

        if product.stock_quantity > 0 {
            tx.append_movement(&LedgerEntry {
                product_id: product.id,
                quantity: product.stock_quantity,
                movement_type: MovementType::In,
                notes: OPENING_STOCK_NOTE.to_string(),
                sale_order_id: None,
            })
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            product_id = product.id,
            stock_quantity = product.stock_quantity,
            "Product created"
        );
        Ok(product)
    }

    /// Get product by ID
    pub async fn get_product(&self, product_id: i64) -> AppResult<Product> {
        let mut tx = self.store.begin().await?;
        let product = tx
            .get_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        tx.commit().await?;
        Ok(product)
    }

    /// List products matching the filter, ordered by ID.
    ///
    /// Serves both the product list (name search only) and the stock level
    /// check (name, supplier and minimum stock).
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Product>> {
        let mut tx = self.store.begin().await?;
        let total = tx.count_products(filter).await?;
        let meta = pagination.resolve(total);
        let products = tx.fetch_products(filter, Window::page(&meta)).await?;
        tx.commit().await?;

        Ok(PaginatedResponse::new(products, meta))
    }

    /// Every product matching the filter, without pagination
    pub async fn all_products(&self, filter: &ProductFilter) -> AppResult<Vec<Product>> {
        let mut tx = self.store.begin().await?;
        let products = tx.fetch_products(filter, Window::all()).await?;
        tx.commit().await?;
        Ok(products)
    }

    /// Compare a product's cached stock with the sum of its ledger
    pub async fn ledger_balance(&self, product_id: i64) -> AppResult<LedgerBalance> {
        let mut tx = self.store.begin().await?;
        let product = tx
            .get_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        let totals = tx.ledger_totals(product_id).await?;
        tx.commit().await?;

        let balance = LedgerBalance::new(
            product.id,
            product.name,
            product.stock_quantity,
            totals.total_in,
            totals.total_out,
            totals.movement_count,
        );

        if !balance.consistent {
            tracing::warn!(
                product_id,
                stock_quantity = balance.stock_quantity,
                net = balance.net,
                "Stock quantity does not match ledger"
            );
        }

        Ok(balance)
    }
}
