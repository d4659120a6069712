//! HTTP handlers for stock movement endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;

use super::{csv_attachment, wants_csv, ListQuery};
use crate::error::{AppError, AppResult};
use crate::models::{MovementFilter, NewStockMovement, Pagination, StockMovement};
use crate::services::{ReportingService, StockService};
use crate::store::Store;
use crate::AppState;

/// Record a stock movement
pub async fn record_movement<S: Store>(
    State(state): State<AppState<S>>,
    WithRejection(Json(input), _): WithRejection<Json<NewStockMovement>, AppError>,
) -> AppResult<(StatusCode, Json<StockMovement>)> {
    let service = StockService::new(state.store);
    let movement = service.record_movement(input).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// List stock movements, searching by product name
pub async fn list_movements<S: Store>(
    State(state): State<AppState<S>>,
    Query(query): Query<ListQuery>,
) -> AppResult<Response> {
    let filter = MovementFilter::new(query.search);

    if wants_csv(query.format.as_deref()) {
        let service = ReportingService::new(state.store);
        let csv = service.movements_csv(&filter).await?;
        return Ok(csv_attachment("stock_movements.csv", csv));
    }

    let service = StockService::new(state.store);
    let movements = service
        .list_movements(&filter, Pagination::from_query(query.page.as_deref()))
        .await?;
    Ok(Json(movements).into_response())
}
