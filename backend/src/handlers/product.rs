//! HTTP handlers for product endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use super::{csv_attachment, wants_csv, ListQuery};
use crate::error::{AppError, AppResult};
use crate::models::{
    LedgerBalance, NewProduct, PaginatedResponse, Pagination, Product, ProductFilter,
};
use crate::services::{ProductService, ReportingService};
use crate::store::Store;
use crate::AppState;

/// Query parameters for the stock level check
#[derive(Debug, Default, Deserialize)]
pub struct StockLevelQuery {
    pub name: Option<String>,
    pub supplier_id: Option<String>,
    pub min_stock: Option<String>,
    pub page: Option<String>,
    pub format: Option<String>,
}

impl StockLevelQuery {
    /// Build the product filter. Blank parameters are ignored.
    pub fn filter(&self) -> AppResult<ProductFilter> {
        let supplier_id = match blank_to_none(self.supplier_id.as_deref()) {
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                AppError::validation(
                    "supplier_id",
                    "Select a valid choice. That choice is not one of the available choices.",
                )
            })?),
            None => None,
        };

        let min_stock = match blank_to_none(self.min_stock.as_deref()) {
            Some(raw) => {
                let min_stock = raw
                    .parse::<i32>()
                    .map_err(|_| AppError::validation("min_stock", "Enter a whole number."))?;
                shared::validate_min_stock(min_stock)
                    .map_err(|message| AppError::validation("min_stock", message))?;
                Some(min_stock)
            }
            None => None,
        };

        Ok(ProductFilter {
            supplier_id,
            min_stock,
            ..ProductFilter::by_name(self.name.clone())
        })
    }
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Create a product
pub async fn create_product<S: Store>(
    State(state): State<AppState<S>>,
    WithRejection(Json(input), _): WithRejection<Json<NewProduct>, AppError>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let service = ProductService::new(state.store);
    let product = service.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// List products, searching by name
pub async fn list_products<S: Store>(
    State(state): State<AppState<S>>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Product>>> {
    let service = ProductService::new(state.store);
    let filter = ProductFilter::by_name(query.search);
    let products = service
        .list_products(&filter, Pagination::from_query(query.page.as_deref()))
        .await?;
    Ok(Json(products))
}

/// Stock level check: filter by name, supplier and minimum stock
pub async fn stock_level<S: Store>(
    State(state): State<AppState<S>>,
    Query(query): Query<StockLevelQuery>,
) -> AppResult<Response> {
    let filter = query.filter()?;

    if wants_csv(query.format.as_deref()) {
        let service = ReportingService::new(state.store);
        let csv = service.stock_level_csv(&filter).await?;
        return Ok(csv_attachment("stock_level.csv", csv));
    }

    let service = ProductService::new(state.store);
    let products = service
        .list_products(&filter, Pagination::from_query(query.page.as_deref()))
        .await?;
    Ok(Json(products).into_response())
}

/// Get a product
pub async fn get_product<S: Store>(
    State(state): State<AppState<S>>,
    Path(product_id): Path<i64>,
) -> AppResult<Json<Product>> {
    let service = ProductService::new(state.store);
    let product = service.get_product(product_id).await?;
    Ok(Json(product))
}

/// Compare a product's stock with its ledger
pub async fn get_ledger_balance<S: Store>(
    State(state): State<AppState<S>>,
    Path(product_id): Path<i64>,
) -> AppResult<Json<LedgerBalance>> {
    let service = ProductService::new(state.store);
    let balance = service.ledger_balance(product_id).await?;
    Ok(Json(balance))
}
