//! In-process store
//!
//! Transactions are serialized behind one async mutex. A transaction works on
//! a private copy of the state and publishes it on commit, so a dropped
//! transaction leaves no trace.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{LedgerTotals, OrderDraft, ProductDraft, Store, StoreTx, Window};
use crate::error::{AppError, AppResult};
use crate::models::{
    LedgerEntry, MovementFilter, MovementType, NewSupplier, OrderStatus, Product, ProductFilter,
    SaleOrder, SaleOrderFilter, StockMovement, Supplier, SupplierFilter,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    suppliers: BTreeMap<i64, Supplier>,
    products: BTreeMap<i64, Product>,
    movements: BTreeMap<i64, StockMovement>,
    orders: BTreeMap<i64, SaleOrder>,
    last_id: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// Store keeping every record in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> AppResult<MemoryTx> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx { guard, working })
    }

    async fn ping(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Open transaction on a [`MemoryStore`]
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

impl MemoryTx {
    fn product_or_missing(&self, id: i64) -> AppResult<&Product> {
        self.working
            .products
            .get(&id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_supplier(&mut self, input: &NewSupplier) -> AppResult<Supplier> {
        let email = input.email.to_lowercase();
        let suppliers = self.working.suppliers.values();
        for existing in suppliers {
            if existing.email.to_lowercase() == email {
                return Err(AppError::duplicate(
                    "email",
                    "A supplier with this email already exists.",
                ));
            }
            if existing.phone == input.phone {
                return Err(AppError::duplicate(
                    "phone",
                    "A supplier with this phone already exists.",
                ));
            }
        }

        let supplier = Supplier {
            id: self.working.next_id(),
            name: input.name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            address: input.address.clone(),
        };
        self.working.suppliers.insert(supplier.id, supplier.clone());
        Ok(supplier)
    }

    async fn get_supplier(&mut self, id: i64) -> AppResult<Option<Supplier>> {
        Ok(self.working.suppliers.get(&id).cloned())
    }

    async fn find_supplier_by_email(&mut self, email: &str) -> AppResult<Option<Supplier>> {
        let email = email.to_lowercase();
        Ok(self
            .working
            .suppliers
            .values()
            .find(|s| s.email.to_lowercase() == email)
            .cloned())
    }

    async fn find_supplier_by_phone(&mut self, phone: &str) -> AppResult<Option<Supplier>> {
        Ok(self
            .working
            .suppliers
            .values()
            .find(|s| s.phone == phone)
            .cloned())
    }

    async fn count_suppliers(&mut self, filter: &SupplierFilter) -> AppResult<u64> {
        Ok(self
            .working
            .suppliers
            .values()
            .filter(|s| filter.matches(s))
            .count() as u64)
    }

    async fn fetch_suppliers(
        &mut self,
        filter: &SupplierFilter,
        window: Window,
    ) -> AppResult<Vec<Supplier>> {
        Ok(window.slice(
            self.working
                .suppliers
                .values()
                .filter(|s| filter.matches(s))
                .cloned(),
        ))
    }

    async fn delete_supplier(&mut self, id: i64) -> AppResult<bool> {
        if self.working.suppliers.remove(&id).is_none() {
            return Ok(false);
        }

        let state = &mut self.working;
        state.products.retain(|_, p| p.supplier_id != id);
        let products = &state.products;
        state
            .movements
            .retain(|_, m| products.contains_key(&m.product_id));
        state
            .orders
            .retain(|_, o| products.contains_key(&o.product_id));
        Ok(true)
    }

    async fn insert_product(&mut self, draft: &ProductDraft) -> AppResult<Product> {
        let name = draft.name.to_lowercase();
        if self
            .working
            .products
            .values()
            .any(|p| p.name.to_lowercase() == name)
        {
            return Err(AppError::duplicate(
                "name",
                "A product with this name already exists.",
            ));
        }
        let supplier_name = match self.working.suppliers.get(&draft.supplier_id) {
            Some(supplier) => supplier.name.clone(),
            None => {
                return Err(AppError::validation(
                    "supplier_id",
                    "Select a valid choice. That choice is not one of the available choices.",
                ))
            }
        };

        let product = Product {
            id: self.working.next_id(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            category: draft.category.clone(),
            price: draft.price,
            stock_quantity: draft.stock_quantity,
            supplier_id: draft.supplier_id,
            supplier_name,
        };
        self.working.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&mut self, id: i64) -> AppResult<Option<Product>> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn lock_product(&mut self, id: i64) -> AppResult<Option<Product>> {
        // The whole state is already held exclusively by this transaction.
        Ok(self.working.products.get(&id).cloned())
    }

    async fn find_product_by_name(&mut self, name: &str) -> AppResult<Option<Product>> {
        let name = name.to_lowercase();
        Ok(self
            .working
            .products
            .values()
            .find(|p| p.name.to_lowercase() == name)
            .cloned())
    }

    async fn set_stock_quantity(
        &mut self,
        product_id: i64,
        stock_quantity: i32,
    ) -> AppResult<()> {
        if stock_quantity < 0 {
            return Err(AppError::Internal(
                "stock_quantity may not be negative".to_string(),
            ));
        }
        let product = self
            .working
            .products
            .get_mut(&product_id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        product.stock_quantity = stock_quantity;
        Ok(())
    }

    async fn count_products(&mut self, filter: &ProductFilter) -> AppResult<u64> {
        Ok(self
            .working
            .products
            .values()
            .filter(|p| filter.matches(p))
            .count() as u64)
    }

    async fn fetch_products(
        &mut self,
        filter: &ProductFilter,
        window: Window,
    ) -> AppResult<Vec<Product>> {
        Ok(window.slice(
            self.working
                .products
                .values()
                .filter(|p| filter.matches(p))
                .cloned(),
        ))
    }

    async fn append_movement(&mut self, entry: &LedgerEntry) -> AppResult<StockMovement> {
        if entry.quantity <= 0 {
            return Err(AppError::Internal(
                "movement quantity must be positive".to_string(),
            ));
        }
        let product_name = self.product_or_missing(entry.product_id)?.name.clone();
        let now = Utc::now();

        let movement = StockMovement {
            id: self.working.next_id(),
            product_id: entry.product_id,
            product_name,
            quantity: entry.quantity,
            movement_type: entry.movement_type,
            movement_date: now.date_naive(),
            notes: entry.notes.clone(),
            sale_order_id: entry.sale_order_id,
            created_at: now,
        };
        self.working.movements.insert(movement.id, movement.clone());
        Ok(movement)
    }

    async fn count_movements(&mut self, filter: &MovementFilter) -> AppResult<u64> {
        Ok(self
            .working
            .movements
            .values()
            .filter(|m| filter.matches(m))
            .count() as u64)
    }

    async fn fetch_movements(
        &mut self,
        filter: &MovementFilter,
        window: Window,
    ) -> AppResult<Vec<StockMovement>> {
        Ok(window.slice(
            self.working
                .movements
                .values()
                .rev()
                .filter(|m| filter.matches(m))
                .cloned(),
        ))
    }

    async fn ledger_totals(&mut self, product_id: i64) -> AppResult<LedgerTotals> {
        let mut totals = LedgerTotals::default();
        for movement in self
            .working
            .movements
            .values()
            .filter(|m| m.product_id == product_id)
        {
            match movement.movement_type {
                MovementType::In => totals.total_in += movement.quantity as i64,
                MovementType::Out => totals.total_out += movement.quantity as i64,
            }
            totals.movement_count += 1;
        }
        Ok(totals)
    }

    async fn insert_sale_order(&mut self, draft: &OrderDraft) -> AppResult<SaleOrder> {
        let product_name = self.product_or_missing(draft.product_id)?.name.clone();
        let now = Utc::now();

        let order = SaleOrder {
            id: self.working.next_id(),
            product_id: draft.product_id,
            product_name,
            quantity: draft.quantity,
            total_price: draft.total_price,
            sale_date: now.date_naive(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.working.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_sale_order(&mut self, id: i64) -> AppResult<Option<SaleOrder>> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn lock_sale_order(&mut self, id: i64) -> AppResult<Option<SaleOrder>> {
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn set_order_status(&mut self, id: i64, status: OrderStatus) -> AppResult<SaleOrder> {
        let order = self
            .working
            .orders
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Sale order".to_string()))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn count_sale_orders(&mut self, filter: &SaleOrderFilter) -> AppResult<u64> {
        Ok(self
            .working
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .count() as u64)
    }

    async fn fetch_sale_orders(
        &mut self,
        filter: &SaleOrderFilter,
        window: Window,
    ) -> AppResult<Vec<SaleOrder>> {
        Ok(window.slice(
            self.working
                .orders
                .values()
                .rev()
                .filter(|o| filter.matches(o))
                .cloned(),
        ))
    }

    async fn commit(self) -> AppResult<()> {
        let MemoryTx { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}
