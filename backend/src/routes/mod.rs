//! Route definitions for the inventory and sales platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, store::Store, AppState};

/// Create API routes
pub fn api_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check::<S>))
        // Catalog
        .nest("/suppliers", supplier_routes())
        .nest("/products", product_routes())
        // Ledger
        .nest("/stock-movements", stock_movement_routes())
        // Order workflow
        .nest("/sales", sale_order_routes())
}

/// Supplier routes
fn supplier_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers::<S>).post(handlers::create_supplier::<S>),
        )
        .route(
            "/:supplier_id",
            get(handlers::get_supplier::<S>).delete(handlers::delete_supplier::<S>),
        )
}

/// Product routes
fn product_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products::<S>).post(handlers::create_product::<S>),
        )
        .route("/stock-level", get(handlers::stock_level::<S>))
        .route("/:product_id", get(handlers::get_product::<S>))
        .route("/:product_id/ledger", get(handlers::get_ledger_balance::<S>))
}

/// Stock movement routes
fn stock_movement_routes<S: Store>() -> Router<AppState<S>> {
    Router::new().route(
        "/",
        get(handlers::list_movements::<S>).post(handlers::record_movement::<S>),
    )
}

/// Sale order routes
fn sale_order_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/",
            get(handlers::list_sale_orders::<S>).post(handlers::create_sale_order::<S>),
        )
        .route("/:order_id", get(handlers::get_sale_order::<S>))
        .route("/:order_id/complete", post(handlers::complete_sale_order::<S>))
        .route("/:order_id/cancel", post(handlers::cancel_sale_order::<S>))
}
