//! Sale order workflow tests
//!
//! Tests for the order lifecycle including:
//! - Stock deduction and the Out movement written on creation
//! - Insufficient stock leaving stock and ledger untouched
//! - Cancellation restoring stock with a matching In movement
//! - Complete/cancel on terminal orders being no-ops

use ims_backend::models::{
    MovementFilter, NewProduct, NewSaleOrder, NewSupplier, OrderStatus, Pagination, Product,
    SaleOrderFilter,
};
use ims_backend::services::{ProductService, SaleOrderService, StockService, SupplierService};
use ims_backend::store::MemoryStore;
use ims_backend::AppError;
use rust_decimal::Decimal;
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn seed_product(store: &MemoryStore, price: &str, stock_quantity: i32) -> Product {
    let supplier = SupplierService::new(store.clone())
        .create_supplier(NewSupplier {
            name: "Test Supplier".to_string(),
            email: "test@supplier.com".to_string(),
            phone: "1234567890".to_string(),
            address: "Test Address".to_string(),
        })
        .await
        .unwrap();

    ProductService::new(store.clone())
        .create_product(NewProduct {
            name: "Test Product".to_string(),
            description: "Test Description".to_string(),
            category: "Test Category".to_string(),
            price: Some(dec(price)),
            stock_quantity: Some(stock_quantity),
            supplier_id: Some(supplier.id),
        })
        .await
        .unwrap()
}

fn order(product_id: i64, quantity: i32) -> NewSaleOrder {
    NewSaleOrder {
        product_id: Some(product_id),
        quantity: Some(quantity),
    }
}

async fn movement_count(store: &MemoryStore) -> u64 {
    StockService::new(store.clone())
        .list_movements(&MovementFilter::default(), Pagination::default())
        .await
        .unwrap()
        .pagination
        .total_items
}

#[tokio::test]
async fn test_create_order_deducts_stock_and_records_movement() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "10.00", 100).await;
    let orders = SaleOrderService::new(store.clone());

    let created = orders.create_order(order(product.id, 10)).await.unwrap();

    assert_eq!(created.total_price, dec("100.00"));
    assert_eq!(created.status, OrderStatus::Pending);
    assert_eq!(created.product_name, "Test Product");

    let product = ProductService::new(store.clone())
        .get_product(product.id)
        .await
        .unwrap();
    assert_eq!(product.stock_quantity, 90);

    let movements = StockService::new(store.clone())
        .all_movements(&MovementFilter::default())
        .await
        .unwrap();
    // Newest first: the sale, then the opening stock
    assert_eq!(movements.len(), 2);
    let sale = &movements[0];
    assert_eq!(sale.quantity, 10);
    assert_eq!(sale.movement_type.as_str(), "Out");
    assert_eq!(sale.notes, format!("Sale Order #{}", created.id));
    assert_eq!(sale.sale_order_id, Some(created.id));
}

#[tokio::test]
async fn test_total_price_is_frozen_at_creation() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "19.99", 10).await;

    let created = SaleOrderService::new(store.clone())
        .create_order(order(product.id, 3))
        .await
        .unwrap();
    assert_eq!(created.total_price, dec("59.97"));

    let fetched = SaleOrderService::new(store.clone())
        .get_order(created.id)
        .await
        .unwrap();
    assert_eq!(fetched.total_price, dec("59.97"));
}

#[tokio::test]
async fn test_insufficient_stock_leaves_state_unchanged() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "10.00", 5).await;
    let before = movement_count(&store).await;

    let err = SaleOrderService::new(store.clone())
        .create_order(order(product.id, 6))
        .await
        .unwrap_err();

    match err {
        AppError::InsufficientStock {
            field,
            message,
            available,
            requested,
        } => {
            assert_eq!(field, "quantity");
            assert_eq!(message, "Insufficient stock for this product.");
            assert_eq!(available, 5);
            assert_eq!(requested, 6);
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let product = ProductService::new(store.clone())
        .get_product(product.id)
        .await
        .unwrap();
    assert_eq!(product.stock_quantity, 5);
    assert_eq!(movement_count(&store).await, before);

    let orders = SaleOrderService::new(store.clone())
        .list_orders(&SaleOrderFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert!(orders.data.is_empty());
}

#[tokio::test]
async fn test_order_for_whole_stock_is_allowed() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "1.00", 4).await;

    SaleOrderService::new(store.clone())
        .create_order(order(product.id, 4))
        .await
        .unwrap();

    let product = ProductService::new(store.clone())
        .get_product(product.id)
        .await
        .unwrap();
    assert_eq!(product.stock_quantity, 0);
}

#[tokio::test]
async fn test_order_validation() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "10.00", 5).await;
    let orders = SaleOrderService::new(store.clone());

    let err = orders.create_order(order(product.id, 0)).await.unwrap_err();
    assert_eq!(err.field(), Some("quantity"));
    assert!(err.to_string().contains("Quantity must be at least 1."));

    let err = orders
        .create_order(NewSaleOrder::default())
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("product_id"));

    let err = orders.create_order(order(9999, 1)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_order_total_above_money_limit_is_rejected() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "99999999.99", 2).await;

    let err = SaleOrderService::new(store.clone())
        .create_order(order(product.id, 2))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("quantity"));

    let product = ProductService::new(store.clone())
        .get_product(product.id)
        .await
        .unwrap();
    assert_eq!(product.stock_quantity, 2);
}

#[tokio::test]
async fn test_cancel_restores_stock() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "10.00", 20).await;
    let orders = SaleOrderService::new(store.clone());

    let created = orders.create_order(order(product.id, 7)).await.unwrap();
    let outcome = orders.cancel_order(created.id).await.unwrap();

    assert!(outcome.applied);
    assert_eq!(outcome.warning, None);
    assert_eq!(outcome.order.status, OrderStatus::Cancelled);
    assert_eq!(outcome.order.total_price, dec("70.00"));

    let product = ProductService::new(store.clone())
        .get_product(product.id)
        .await
        .unwrap();
    assert_eq!(product.stock_quantity, 20);

    let movements = StockService::new(store.clone())
        .all_movements(&MovementFilter::default())
        .await
        .unwrap();
    let restore = &movements[0];
    assert_eq!(restore.movement_type.as_str(), "In");
    assert_eq!(restore.quantity, 7);
    assert_eq!(restore.notes, format!("Cancelled Sale Order #{}", created.id));
    assert_eq!(restore.sale_order_id, Some(created.id));
}

#[tokio::test]
async fn test_cancel_twice_is_a_noop() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "10.00", 20).await;
    let orders = SaleOrderService::new(store.clone());

    let created = orders.create_order(order(product.id, 5)).await.unwrap();
    orders.cancel_order(created.id).await.unwrap();
    let before = movement_count(&store).await;

    let outcome = orders.cancel_order(created.id).await.unwrap();
    assert!(!outcome.applied);
    assert_eq!(
        outcome.warning.as_deref(),
        Some("Only 'Pending' orders can be cancelled.")
    );
    assert_eq!(outcome.order.status, OrderStatus::Cancelled);

    let product = ProductService::new(store.clone())
        .get_product(product.id)
        .await
        .unwrap();
    assert_eq!(product.stock_quantity, 20);
    assert_eq!(movement_count(&store).await, before);
}

#[tokio::test]
async fn test_complete_does_not_touch_stock() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "10.00", 20).await;
    let orders = SaleOrderService::new(store.clone());

    let created = orders.create_order(order(product.id, 5)).await.unwrap();
    let before = movement_count(&store).await;

    let outcome = orders.complete_order(created.id).await.unwrap();
    assert!(outcome.applied);
    assert_eq!(outcome.order.status, OrderStatus::Completed);

    let product = ProductService::new(store.clone())
        .get_product(product.id)
        .await
        .unwrap();
    assert_eq!(product.stock_quantity, 15);
    assert_eq!(movement_count(&store).await, before);
}

#[tokio::test]
async fn test_terminal_orders_reject_transitions() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "10.00", 20).await;
    let orders = SaleOrderService::new(store.clone());

    let completed = orders.create_order(order(product.id, 2)).await.unwrap();
    orders.complete_order(completed.id).await.unwrap();

    let outcome = orders.complete_order(completed.id).await.unwrap();
    assert!(!outcome.applied);
    assert_eq!(
        outcome.warning.as_deref(),
        Some("Only 'Pending' orders can be completed.")
    );

    // A completed order cannot be cancelled, so its stock stays sold
    let outcome = orders.cancel_order(completed.id).await.unwrap();
    assert!(!outcome.applied);
    assert_eq!(outcome.order.status, OrderStatus::Completed);

    let cancelled = orders.create_order(order(product.id, 3)).await.unwrap();
    orders.cancel_order(cancelled.id).await.unwrap();
    let outcome = orders.complete_order(cancelled.id).await.unwrap();
    assert!(!outcome.applied);
    assert_eq!(outcome.order.status, OrderStatus::Cancelled);

    let product = ProductService::new(store.clone())
        .get_product(product.id)
        .await
        .unwrap();
    assert_eq!(product.stock_quantity, 18);
}

#[tokio::test]
async fn test_transition_unknown_order() {
    let orders = SaleOrderService::new(MemoryStore::new());
    assert!(matches!(
        orders.cancel_order(42).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        orders.complete_order(42).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_list_orders_by_status_newest_first() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "1.00", 50).await;
    let orders = SaleOrderService::new(store.clone());

    let first = orders.create_order(order(product.id, 1)).await.unwrap();
    let second = orders.create_order(order(product.id, 1)).await.unwrap();
    let third = orders.create_order(order(product.id, 1)).await.unwrap();
    orders.cancel_order(second.id).await.unwrap();

    let all = orders
        .list_orders(&SaleOrderFilter::default(), Pagination::default())
        .await
        .unwrap();
    let ids: Vec<i64> = all.data.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);

    let pending = orders
        .list_orders(
            &SaleOrderFilter::parse(Some("Pending")).unwrap(),
            Pagination::default(),
        )
        .await
        .unwrap();
    let ids: Vec<i64> = pending.data.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![third.id, first.id]);

    let cancelled = orders
        .list_orders(
            &SaleOrderFilter::parse(Some("Cancelled")).unwrap(),
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(cancelled.pagination.total_items, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cancels_restore_stock_once() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "10.00", 20).await;
    let orders = SaleOrderService::new(store.clone());
    let created = orders.create_order(order(product.id, 5)).await.unwrap();
    let order_id = created.id;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let orders = orders.clone();
            tokio::spawn(async move { orders.cancel_order(order_id).await })
        })
        .collect();

    let mut applied = 0;
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome.order.status, OrderStatus::Cancelled);
        if outcome.applied {
            applied += 1;
        }
    }
    assert_eq!(applied, 1);

    let balance = ProductService::new(store.clone())
        .ledger_balance(product.id)
        .await
        .unwrap();
    assert_eq!(balance.stock_quantity, 20);
    assert!(balance.consistent);

    let restores = StockService::new(store.clone())
        .all_movements(&MovementFilter::default())
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.sale_order_id == Some(created.id) && m.movement_type.as_str() == "In")
        .count();
    assert_eq!(restores, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_orders_never_oversell() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "1.00", 10).await;
    let orders = SaleOrderService::new(store.clone());

    let product_id = product.id;

    // 12 orders of 3 against 10 in stock: at most 3 can succeed
    let handles: Vec<_> = (0..12)
        .map(|_| {
            let orders = orders.clone();
            tokio::spawn(async move { orders.create_order(order(product_id, 3)).await })
        })
        .collect();

    let mut placed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(AppError::InsufficientStock { .. }) => {}
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }
    assert_eq!(placed, 3);

    let balance = ProductService::new(store.clone())
        .ledger_balance(product.id)
        .await
        .unwrap();
    assert_eq!(balance.stock_quantity, 1);
    assert!(balance.consistent);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_racing_supplier_delete() {
    let store = MemoryStore::new();
    let product = seed_product(&store, "10.00", 20).await;
    let orders = SaleOrderService::new(store.clone());
    let created = orders.create_order(order(product.id, 5)).await.unwrap();
    let order_id = created.id;
    let supplier_id = product.supplier_id;

    let cancel = {
        let orders = orders.clone();
        tokio::spawn(async move { orders.cancel_order(order_id).await })
    };
    let delete = {
        let suppliers = SupplierService::new(store.clone());
        tokio::spawn(async move { suppliers.delete_supplier(supplier_id).await })
    };

    delete.await.unwrap().unwrap();
    match cancel.await.unwrap() {
        Ok(outcome) => assert!(outcome.applied),
        Err(AppError::NotFound(_)) => {}
        Err(e) => panic!("unexpected error: {:?}", e),
    }

    assert!(matches!(
        orders.get_order(created.id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert_eq!(movement_count(&store).await, 0);
}
