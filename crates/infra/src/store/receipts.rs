use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use tracing::instrument;

use shopfloor_core::{GoodsReceiptId, PurchaseOrderId};
use shopfloor_purchasing::{GoodsReceipt, ReceivedLine};

use super::GoodsReceiptStore;
use crate::error::{StoreError, StoreResult, corrupt, is_foreign_key_violation, map_sqlx_error};

const SELECT_RECEIPT: &str = "SELECT id, code, date, po_id, items FROM receiving_goods";

#[derive(Debug, Clone)]
pub struct SqliteGoodsReceiptStore {
    pool: SqlitePool,
}

impl SqliteGoodsReceiptStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GoodsReceiptStore for SqliteGoodsReceiptStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<GoodsReceipt>> {
        let rows = sqlx::query(&format!("{SELECT_RECEIPT} ORDER BY date DESC, code"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_receipts", e))?;

        rows.iter().map(receipt_from_row).collect()
    }

    #[instrument(skip(self), fields(receipt_id = %id), err)]
    async fn get(&self, id: &GoodsReceiptId) -> StoreResult<GoodsReceipt> {
        let row = sqlx::query(&format!("{SELECT_RECEIPT} WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_receipt", e))?
            .ok_or(StoreError::NotFound("receipt"))?;

        receipt_from_row(&row)
    }

    #[instrument(skip(self, receipt), fields(receipt_id = %receipt.id, po_id = %receipt.po_id), err)]
    async fn insert(&self, receipt: &GoodsReceipt) -> StoreResult<()> {
        let items = encode_items(&receipt.items)?;
        sqlx::query("INSERT INTO receiving_goods (id, code, date, po_id, items) VALUES (?, ?, ?, ?, ?)")
            .bind(receipt.id.as_str())
            .bind(&receipt.code)
            .bind(receipt.date)
            .bind(receipt.po_id.as_str())
            .bind(items)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::NotFound("purchase order")
                } else {
                    map_sqlx_error("insert_receipt", e)
                }
            })?;
        Ok(())
    }

    #[instrument(skip(self, receipt), fields(receipt_id = %receipt.id, po_id = %receipt.po_id), err)]
    async fn update(&self, receipt: &GoodsReceipt) -> StoreResult<()> {
        let items = encode_items(&receipt.items)?;
        let result =
            sqlx::query("UPDATE receiving_goods SET code = ?, date = ?, po_id = ?, items = ? WHERE id = ?")
                .bind(&receipt.code)
                .bind(receipt.date)
                .bind(receipt.po_id.as_str())
                .bind(items)
                .bind(receipt.id.as_str())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    if is_foreign_key_violation(&e) {
                        StoreError::NotFound("purchase order")
                    } else {
                        map_sqlx_error("update_receipt", e)
                    }
                })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("receipt"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(receipt_id = %id), err)]
    async fn delete(&self, id: &GoodsReceiptId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM receiving_goods WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_receipt", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("receipt"));
        }
        Ok(())
    }
}

fn encode_items(items: &[ReceivedLine]) -> StoreResult<String> {
    serde_json::to_string(items).map_err(|e| StoreError::Validation(format!("items: {e}")))
}

#[derive(Debug)]
struct ReceiptRow {
    id: String,
    code: String,
    date: NaiveDate,
    po_id: String,
    items: String,
}

impl<'r> FromRow<'r, SqliteRow> for ReceiptRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(ReceiptRow {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            date: row.try_get("date")?,
            po_id: row.try_get("po_id")?,
            items: row.try_get("items")?,
        })
    }
}

fn receipt_from_row(row: &SqliteRow) -> StoreResult<GoodsReceipt> {
    let row = ReceiptRow::from_row(row).map_err(|e| corrupt("receiving_goods", e))?;
    Ok(GoodsReceipt {
        id: GoodsReceiptId::try_from(row.id).map_err(|e| corrupt("receiving_goods.id", e))?,
        code: row.code,
        date: row.date,
        po_id: PurchaseOrderId::try_from(row.po_id)
            .map_err(|e| corrupt("receiving_goods.po_id", e))?,
        items: serde_json::from_str(&row.items).map_err(|e| corrupt("receiving_goods.items", e))?,
    })
}
