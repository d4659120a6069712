//! HTTP handlers for sale order endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::{
    NewSaleOrder, PaginatedResponse, Pagination, SaleOrder, SaleOrderFilter, TransitionOutcome,
};
use crate::services::SaleOrderService;
use crate::store::Store;
use crate::AppState;

/// Query parameters for listing sale orders
#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub page: Option<String>,
}

/// Place a sale order
pub async fn create_sale_order<S: Store>(
    State(state): State<AppState<S>>,
    WithRejection(Json(input), _): WithRejection<Json<NewSaleOrder>, AppError>,
) -> AppResult<(StatusCode, Json<SaleOrder>)> {
    let service = SaleOrderService::new(state.store);
    let order = service.create_order(input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List sale orders, optionally by status
pub async fn list_sale_orders<S: Store>(
    State(state): State<AppState<S>>,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<Json<PaginatedResponse<SaleOrder>>> {
    let filter = SaleOrderFilter::parse(query.status.as_deref())
        .map_err(|message| AppError::validation("status", message))?;

    let service = SaleOrderService::new(state.store);
    let orders = service
        .list_orders(&filter, Pagination::from_query(query.page.as_deref()))
        .await?;
    Ok(Json(orders))
}

/// Get a sale order
pub async fn get_sale_order<S: Store>(
    State(state): State<AppState<S>>,
    Path(order_id): Path<i64>,
) -> AppResult<Json<SaleOrder>> {
    let service = SaleOrderService::new(state.store);
    let order = service.get_order(order_id).await?;
    Ok(Json(order))
}

/// Complete a pending sale order
pub async fn complete_sale_order<S: Store>(
    State(state): State<AppState<S>>,
    Path(order_id): Path<i64>,
) -> AppResult<Json<TransitionOutcome>> {
    let service = SaleOrderService::new(state.store);
    let outcome = service.complete_order(order_id).await?;
    Ok(Json(outcome))
}

/// Cancel a pending sale order and restore its stock
pub async fn cancel_sale_order<S: Store>(
    State(state): State<AppState<S>>,
    Path(order_id): Path<i64>,
) -> AppResult<Json<TransitionOutcome>> {
    let service = SaleOrderService::new(state.store);
    let outcome = service.cancel_order(order_id).await?;
    Ok(Json(outcome))
}
