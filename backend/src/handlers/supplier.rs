//! HTTP handlers for supplier endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;

use super::ListQuery;
use crate::error::{AppError, AppResult};
use crate::models::{NewSupplier, PaginatedResponse, Pagination, Supplier, SupplierFilter};
use crate::services::SupplierService;
use crate::store::Store;
use crate::AppState;

/// Create a supplier
pub async fn create_supplier<S: Store>(
    State(state): State<AppState<S>>,
    WithRejection(Json(input), _): WithRejection<Json<NewSupplier>, AppError>,
) -> AppResult<(StatusCode, Json<Supplier>)> {
    let service = SupplierService::new(state.store);
    let supplier = service.create_supplier(input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

/// List suppliers, searching name and email
pub async fn list_suppliers<S: Store>(
    State(state): State<AppState<S>>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<PaginatedResponse<Supplier>>> {
    let service = SupplierService::new(state.store);
    let filter = SupplierFilter::new(query.search);
    let suppliers = service
        .list_suppliers(&filter, Pagination::from_query(query.page.as_deref()))
        .await?;
    Ok(Json(suppliers))
}

/// Get a supplier
pub async fn get_supplier<S: Store>(
    State(state): State<AppState<S>>,
    Path(supplier_id): Path<i64>,
) -> AppResult<Json<Supplier>> {
    let service = SupplierService::new(state.store);
    let supplier = service.get_supplier(supplier_id).await?;
    Ok(Json(supplier))
}

/// Delete a supplier and everything that depends on it
pub async fn delete_supplier<S: Store>(
    State(state): State<AppState<S>>,
    Path(supplier_id): Path<i64>,
) -> AppResult<StatusCode> {
    let service = SupplierService::new(state.store);
    service.delete_supplier(supplier_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
