//! PostgreSQL store

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use super::{LedgerTotals, OrderDraft, ProductDraft, Store, StoreTx, Window};
use crate::error::{AppError, AppResult};
use crate::models::{
    LedgerEntry, MovementFilter, MovementType, NewSupplier, OrderStatus, Product, ProductFilter,
    SaleOrder, SaleOrderFilter, StockMovement, Supplier, SupplierFilter,
};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Store backed by a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> AppResult<PgTx> {
        let tx = self.db.begin().await?;
        Ok(PgTx { tx })
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db).await.is_ok()
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

/// Open transaction on a [`PgStore`]
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, FromRow)]
struct SupplierRow {
    id: i64,
    name: String,
    email: String,
    phone: String,
    address: String,
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        Supplier {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    category: String,
    price: Decimal,
    stock_quantity: i32,
    supplier_id: i64,
    supplier_name: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            category: row.category,
            price: row.price,
            stock_quantity: row.stock_quantity,
            supplier_id: row.supplier_id,
            supplier_name: row.supplier_name,
        }
    }
}

#[derive(Debug, FromRow)]
struct MovementRow {
    id: i64,
    product_id: i64,
    product_name: String,
    quantity: i32,
    movement_type: String,
    movement_date: NaiveDate,
    notes: String,
    sale_order_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = AppError;

    fn try_from(row: MovementRow) -> AppResult<Self> {
        let movement_type = row.movement_type.parse::<MovementType>().map_err(|_| {
            AppError::Internal(format!("Unknown movement type: {}", row.movement_type))
        })?;
        Ok(StockMovement {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            movement_type,
            movement_date: row.movement_date,
            notes: row.notes,
            sale_order_id: row.sale_order_id,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SaleOrderRow {
    id: i64,
    product_id: i64,
    product_name: String,
    quantity: i32,
    total_price: Decimal,
    sale_date: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SaleOrderRow> for SaleOrder {
    type Error = AppError;

    fn try_from(row: SaleOrderRow) -> AppResult<Self> {
        let status = row.status.parse::<OrderStatus>().map_err(AppError::Internal)?;
        Ok(SaleOrder {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            total_price: row.total_price,
            sale_date: row.sale_date,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct TotalsRow {
    total_in: i64,
    total_out: i64,
    movement_count: i64,
}

// ============================================================================
// Queries
// ============================================================================

const SUPPLIER_COLUMNS: &str = "id, name, email, phone, address";

const PRODUCT_SELECT: &str = r#"
    SELECT p.id, p.name, p.description, p.category, p.price, p.stock_quantity,
           p.supplier_id, s.name AS supplier_name
    FROM products p
    JOIN suppliers s ON s.id = p.supplier_id
"#;

const PRODUCT_FILTER: &str = r#"
    WHERE ($1::TEXT IS NULL OR p.name ILIKE $1)
      AND ($2::BIGINT IS NULL OR p.supplier_id = $2)
      AND ($3::INTEGER IS NULL OR p.stock_quantity >= $3)
"#;

const MOVEMENT_SELECT: &str = r#"
    SELECT m.id, m.product_id, p.name AS product_name, m.quantity, m.movement_type,
           m.movement_date, m.notes, m.sale_order_id, m.created_at
    FROM stock_movements m
    JOIN products p ON p.id = m.product_id
"#;

const ORDER_SELECT: &str = r#"
    SELECT o.id, o.product_id, p.name AS product_name, o.quantity, o.total_price,
           o.sale_date, o.status, o.created_at, o.updated_at
    FROM sale_orders o
    JOIN products p ON p.id = o.product_id
"#;

/// `ILIKE` pattern matching `term` anywhere, with wildcards in `term` escaped
fn like_pattern(term: Option<&str>) -> Option<String> {
    term.map(|t| {
        let escaped = t
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

fn window_params(window: Window) -> (Option<i64>, i64) {
    (
        window.limit.map(|l| l.min(i64::MAX as u64) as i64),
        window.offset.min(i64::MAX as u64) as i64,
    )
}

/// Map constraint violations to the field errors the services report
fn map_constraint(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &error {
        let constraint = db.constraint().unwrap_or_default();
        match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => match constraint {
                "suppliers_email_lower_key" => {
                    return AppError::duplicate(
                        "email",
                        "A supplier with this email already exists.",
                    )
                }
                "suppliers_phone_key" => {
                    return AppError::duplicate(
                        "phone",
                        "A supplier with this phone already exists.",
                    )
                }
                "products_name_lower_key" => {
                    return AppError::duplicate(
                        "name",
                        "A product with this name already exists.",
                    )
                }
                _ => {}
            },
            Some(FOREIGN_KEY_VIOLATION) if constraint == "products_supplier_id_fkey" => {
                return AppError::validation(
                    "supplier_id",
                    "Select a valid choice. That choice is not one of the available choices.",
                )
            }
            _ => {}
        }
    }
    AppError::DatabaseError(error)
}

#[async_trait]
impl StoreTx for PgTx {
    async fn insert_supplier(&mut self, input: &NewSupplier) -> AppResult<Supplier> {
        let row = sqlx::query_as::<_, SupplierRow>(&format!(
            "INSERT INTO suppliers (name, email, phone, address) VALUES ($1, $2, $3, $4) RETURNING {}",
            SUPPLIER_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_constraint)?;

        Ok(row.into())
    }

    async fn get_supplier(&mut self, id: i64) -> AppResult<Option<Supplier>> {
        let row = sqlx::query_as::<_, SupplierRow>(&format!(
            "SELECT {} FROM suppliers WHERE id = $1",
            SUPPLIER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_supplier_by_email(&mut self, email: &str) -> AppResult<Option<Supplier>> {
        let row = sqlx::query_as::<_, SupplierRow>(&format!(
            "SELECT {} FROM suppliers WHERE LOWER(email) = LOWER($1)",
            SUPPLIER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_supplier_by_phone(&mut self, phone: &str) -> AppResult<Option<Supplier>> {
        let row = sqlx::query_as::<_, SupplierRow>(&format!(
            "SELECT {} FROM suppliers WHERE phone = $1",
            SUPPLIER_COLUMNS
        ))
        .bind(phone)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn count_suppliers(&mut self, filter: &SupplierFilter) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM suppliers
            WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR email ILIKE $1)
            "#,
        )
        .bind(like_pattern(filter.search.as_deref()))
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count as u64)
    }

    async fn fetch_suppliers(
        &mut self,
        filter: &SupplierFilter,
        window: Window,
    ) -> AppResult<Vec<Supplier>> {
        let (limit, offset) = window_params(window);
        let rows = sqlx::query_as::<_, SupplierRow>(&format!(
            r#"
            SELECT {} FROM suppliers
            WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR email ILIKE $1)
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
            SUPPLIER_COLUMNS
        ))
        .bind(like_pattern(filter.search.as_deref()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_supplier(&mut self, id: i64) -> AppResult<bool> {
        // Orders before products, the same order a cancellation locks them in
        sqlx::query(
            r#"
            SELECT o.id FROM sale_orders o
            JOIN products p ON p.id = o.product_id
            WHERE p.supplier_id = $1
            ORDER BY o.id
            FOR UPDATE OF o
            "#,
        )
        .bind(id)
        .fetch_all(&mut *self.tx)
        .await?;
        sqlx::query("SELECT id FROM products WHERE supplier_id = $1 ORDER BY id FOR UPDATE")
            .bind(id)
            .fetch_all(&mut *self.tx)
            .await?;

        // Products, their movements and orders go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_product(&mut self, draft: &ProductDraft) -> AppResult<Product> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products (name, description, category, price, stock_quantity, supplier_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.category)
        .bind(draft.price)
        .bind(draft.stock_quantity)
        .bind(draft.supplier_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_constraint)?;

        self.get_product(id)
            .await?
            .ok_or_else(|| AppError::Internal("Inserted product vanished".to_string()))
    }

    async fn get_product(&mut self, id: i64) -> AppResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{} WHERE p.id = $1", PRODUCT_SELECT))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(Into::into))
    }

    async fn lock_product(&mut self, id: i64) -> AppResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "{} WHERE p.id = $1 FOR UPDATE OF p",
            PRODUCT_SELECT
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_product_by_name(&mut self, name: &str) -> AppResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "{} WHERE LOWER(p.name) = LOWER($1)",
            PRODUCT_SELECT
        ))
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn set_stock_quantity(
        &mut self,
        product_id: i64,
        stock_quantity: i32,
    ) -> AppResult<()> {
        let result = sqlx::query("UPDATE products SET stock_quantity = $2 WHERE id = $1")
            .bind(product_id)
            .bind(stock_quantity)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(())
    }

    async fn count_products(&mut self, filter: &ProductFilter) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM products p {}",
            PRODUCT_FILTER
        ))
        .bind(like_pattern(filter.name.as_deref()))
        .bind(filter.supplier_id)
        .bind(filter.min_stock)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count as u64)
    }

    async fn fetch_products(
        &mut self,
        filter: &ProductFilter,
        window: Window,
    ) -> AppResult<Vec<Product>> {
        let (limit, offset) = window_params(window);
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{} {} ORDER BY p.id LIMIT $4 OFFSET $5",
            PRODUCT_SELECT, PRODUCT_FILTER
        ))
        .bind(like_pattern(filter.name.as_deref()))
        .bind(filter.supplier_id)
        .bind(filter.min_stock)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn append_movement(&mut self, entry: &LedgerEntry) -> AppResult<StockMovement> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO stock_movements (product_id, quantity, movement_type, notes, sale_order_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(entry.product_id)
        .bind(entry.quantity)
        .bind(entry.movement_type.as_str())
        .bind(&entry.notes)
        .bind(entry.sale_order_id)
        .fetch_one(&mut *self.tx)
        .await?;

        let row = sqlx::query_as::<_, MovementRow>(&format!("{} WHERE m.id = $1", MOVEMENT_SELECT))
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await?;

        row.try_into()
    }

    async fn count_movements(&mut self, filter: &MovementFilter) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM stock_movements m
            JOIN products p ON p.id = m.product_id
            WHERE ($1::TEXT IS NULL OR p.name ILIKE $1)
            "#,
        )
        .bind(like_pattern(filter.search.as_deref()))
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count as u64)
    }

    async fn fetch_movements(
        &mut self,
        filter: &MovementFilter,
        window: Window,
    ) -> AppResult<Vec<StockMovement>> {
        let (limit, offset) = window_params(window);
        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            r#"{}
            WHERE ($1::TEXT IS NULL OR p.name ILIKE $1)
            ORDER BY m.id DESC
            LIMIT $2 OFFSET $3
            "#,
            MOVEMENT_SELECT
        ))
        .bind(like_pattern(filter.search.as_deref()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn ledger_totals(&mut self, product_id: i64) -> AppResult<LedgerTotals> {
        let row = sqlx::query_as::<_, TotalsRow>(
            r#"
            SELECT
                COALESCE(SUM(quantity) FILTER (WHERE movement_type = 'In'), 0)::BIGINT AS total_in,
                COALESCE(SUM(quantity) FILTER (WHERE movement_type = 'Out'), 0)::BIGINT AS total_out,
                COUNT(*) AS movement_count
            FROM stock_movements
            WHERE product_id = $1
            "#,
        )
        .bind(product_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(LedgerTotals {
            total_in: row.total_in,
            total_out: row.total_out,
            movement_count: row.movement_count,
        })
    }

    async fn insert_sale_order(&mut self, draft: &OrderDraft) -> AppResult<SaleOrder> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sale_orders (product_id, quantity, total_price, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(draft.product_id)
        .bind(draft.quantity)
        .bind(draft.total_price)
        .bind(OrderStatus::Pending.as_str())
        .fetch_one(&mut *self.tx)
        .await?;

        self.get_sale_order(id)
            .await?
            .ok_or_else(|| AppError::Internal("Inserted sale order vanished".to_string()))
    }

    async fn get_sale_order(&mut self, id: i64) -> AppResult<Option<SaleOrder>> {
        let row = sqlx::query_as::<_, SaleOrderRow>(&format!("{} WHERE o.id = $1", ORDER_SELECT))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn lock_sale_order(&mut self, id: i64) -> AppResult<Option<SaleOrder>> {
        let row = sqlx::query_as::<_, SaleOrderRow>(&format!(
            "{} WHERE o.id = $1 FOR UPDATE OF o",
            ORDER_SELECT
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn set_order_status(&mut self, id: i64, status: OrderStatus) -> AppResult<SaleOrder> {
        let result =
            sqlx::query("UPDATE sale_orders SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .execute(&mut *self.tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Sale order".to_string()));
        }

        self.get_sale_order(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale order".to_string()))
    }

    async fn count_sale_orders(&mut self, filter: &SaleOrderFilter) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sale_orders WHERE ($1::TEXT IS NULL OR status = $1)",
        )
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count as u64)
    }

    async fn fetch_sale_orders(
        &mut self,
        filter: &SaleOrderFilter,
        window: Window,
    ) -> AppResult<Vec<SaleOrder>> {
        let (limit, offset) = window_params(window);
        let rows = sqlx::query_as::<_, SaleOrderRow>(&format!(
            r#"{}
            WHERE ($1::TEXT IS NULL OR o.status = $1)
            ORDER BY o.id DESC
            LIMIT $2 OFFSET $3
            "#,
            ORDER_SELECT
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(None), None);
        assert_eq!(like_pattern(Some("abc")), Some("%abc%".to_string()));
        assert_eq!(like_pattern(Some("50%_off")), Some("%50\\%\\_off%".to_string()));
    }

    #[test]
    fn test_window_params() {
        assert_eq!(window_params(Window::all()), (None, 0));
        assert_eq!(
            window_params(Window {
                limit: Some(10),
                offset: 20
            }),
            (Some(10), 20)
        );
    }
}
