use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use tracing::instrument;

use shopfloor_core::{PurchaseOrderId, SupplierId};
use shopfloor_purchasing::{OrderLine, PurchaseOrder, PurchaseOrderStatus};

use super::PurchaseOrderStore;
use crate::error::{StoreError, StoreResult, corrupt, map_reference_error, map_sqlx_error};

const SELECT_ORDER: &str = r#"
    SELECT id, code, date, supplier_id, description, items, status, grand_total
    FROM purchase_orders
"#;

#[derive(Debug, Clone)]
pub struct SqlitePurchaseOrderStore {
    pool: SqlitePool,
}

impl SqlitePurchaseOrderStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PurchaseOrderStore for SqlitePurchaseOrderStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<PurchaseOrder>> {
        let rows = sqlx::query(&format!("{SELECT_ORDER} ORDER BY date DESC, code"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_purchase_orders", e))?;

        rows.iter().map(order_from_row).collect()
    }

    #[instrument(skip(self), fields(po_id = %id), err)]
    async fn get(&self, id: &PurchaseOrderId) -> StoreResult<PurchaseOrder> {
        let row = sqlx::query(&format!("{SELECT_ORDER} WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_purchase_order", e))?
            .ok_or(StoreError::NotFound("purchase order"))?;

        order_from_row(&row)
    }

    #[instrument(skip(self, order), fields(po_id = %order.id, lines = order.items.len()), err)]
    async fn insert(&self, order: &PurchaseOrder) -> StoreResult<()> {
        let items = encode_items(&order.items)?;
        sqlx::query(
            r#"
            INSERT INTO purchase_orders (
                id, code, date, supplier_id, description, items, status, grand_total
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.id.as_str())
        .bind(&order.code)
        .bind(order.date)
        .bind(order.supplier_id.as_str())
        .bind(order.description.as_deref())
        .bind(items)
        .bind(order.status.as_str())
        .bind(order.grand_total)
        .execute(&self.pool)
        .await
        .map_err(|e| map_reference_error("insert_purchase_order", "supplierId", e))?;
        Ok(())
    }

    #[instrument(skip(self, order), fields(po_id = %order.id, lines = order.items.len()), err)]
    async fn update(&self, order: &PurchaseOrder) -> StoreResult<()> {
        let items = encode_items(&order.items)?;
        let result = sqlx::query(
            r#"
            UPDATE purchase_orders
            SET code = ?, date = ?, supplier_id = ?, description = ?, items = ?,
                status = ?, grand_total = ?
            WHERE id = ?
            "#,
        )
        .bind(&order.code)
        .bind(order.date)
        .bind(order.supplier_id.as_str())
        .bind(order.description.as_deref())
        .bind(items)
        .bind(order.status.as_str())
        .bind(order.grand_total)
        .bind(order.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_reference_error("update_purchase_order", "supplierId", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("purchase order"));
        }
        Ok(())
    }

    /// Orders still referenced by receipts cannot be deleted (`Conflict`).
    #[instrument(skip(self), fields(po_id = %id), err)]
    async fn delete(&self, id: &PurchaseOrderId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM purchase_orders WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_purchase_order", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("purchase order"));
        }
        Ok(())
    }
}

fn encode_items(items: &[OrderLine]) -> StoreResult<String> {
    serde_json::to_string(items).map_err(|e| StoreError::Validation(format!("items: {e}")))
}

#[derive(Debug)]
struct PurchaseOrderRow {
    id: String,
    code: String,
    date: NaiveDate,
    supplier_id: String,
    description: Option<String>,
    items: String,
    status: String,
    grand_total: f64,
}

impl<'r> FromRow<'r, SqliteRow> for PurchaseOrderRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(PurchaseOrderRow {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            date: row.try_get("date")?,
            supplier_id: row.try_get("supplier_id")?,
            description: row.try_get("description")?,
            items: row.try_get("items")?,
            status: row.try_get("status")?,
            grand_total: row.try_get("grand_total")?,
        })
    }
}

fn order_from_row(row: &SqliteRow) -> StoreResult<PurchaseOrder> {
    let row = PurchaseOrderRow::from_row(row).map_err(|e| corrupt("purchase_orders", e))?;
    Ok(PurchaseOrder {
        id: PurchaseOrderId::try_from(row.id).map_err(|e| corrupt("purchase_orders.id", e))?,
        code: row.code,
        date: row.date,
        supplier_id: SupplierId::try_from(row.supplier_id)
            .map_err(|e| corrupt("purchase_orders.supplier_id", e))?,
        description: row.description,
        items: serde_json::from_str(&row.items).map_err(|e| corrupt("purchase_orders.items", e))?,
        status: row
            .status
            .parse::<PurchaseOrderStatus>()
            .map_err(|e| corrupt("purchase_orders.status", e))?,
        grand_total: row.grand_total,
    })
}
