//! Reporting service for CSV data export

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::{MovementFilter, Product, ProductFilter, StockMovement};
use crate::services::{ProductService, StockService};
use crate::store::Store;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService<S: Store> {
    store: S,
}

/// Stock level report row
#[derive(Debug, Serialize)]
pub struct StockLevelRow {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub supplier: String,
    pub price: Decimal,
    pub stock_quantity: i32,
}

impl StockLevelRow {
    pub const HEADERS: [&'static str; 6] =
        ["id", "name", "category", "supplier", "price", "stock_quantity"];
}

impl From<Product> for StockLevelRow {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            category: product.category,
            supplier: product.supplier_name,
            price: product.price,
            stock_quantity: product.stock_quantity,
        }
    }
}

/// Stock movement report row
#[derive(Debug, Serialize)]
pub struct MovementRow {
    pub id: i64,
    pub product: String,
    pub movement_type: &'static str,
    pub quantity: i32,
    pub movement_date: NaiveDate,
    pub notes: String,
    pub sale_order_id: Option<i64>,
}

impl MovementRow {
    pub const HEADERS: [&'static str; 7] = [
        "id",
        "product",
        "movement_type",
        "quantity",
        "movement_date",
        "notes",
        "sale_order_id",
    ];
}

impl From<StockMovement> for MovementRow {
    fn from(movement: StockMovement) -> Self {
        Self {
            id: movement.id,
            product: movement.product_name,
            movement_type: movement.movement_type.as_str(),
            quantity: movement.quantity,
            movement_date: movement.movement_date,
            notes: movement.notes,
            sale_order_id: movement.sale_order_id,
        }
    }
}

impl<S: Store> ReportingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Stock level check as CSV
    pub async fn stock_level_csv(&self, filter: &ProductFilter) -> AppResult<String> {
        let products = ProductService::new(self.store.clone())
            .all_products(filter)
            .await?;
        let rows: Vec<StockLevelRow> = products.into_iter().map(Into::into).collect();
        Self::export_to_csv(&StockLevelRow::HEADERS, &rows)
    }

    /// Stock movements as CSV, newest first
    pub async fn movements_csv(&self, filter: &MovementFilter) -> AppResult<String> {
        let movements = StockService::new(self.store.clone())
            .all_movements(filter)
            .await?;
        let rows: Vec<MovementRow> = movements.into_iter().map(Into::into).collect();
        Self::export_to_csv(&MovementRow::HEADERS, &rows)
    }

    /// Export report data as CSV.
    ///
    /// The header row is written even when there is no data.
    pub fn export_to_csv<T: Serialize>(headers: &[&str], data: &[T]) -> AppResult<String> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(vec![]);
        wtr.write_record(headers)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}
