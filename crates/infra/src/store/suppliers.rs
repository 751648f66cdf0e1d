use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use tracing::instrument;

use shopfloor_core::SupplierId;
use shopfloor_parties::Supplier;

use super::SupplierStore;
use crate::error::{StoreError, StoreResult, corrupt, map_sqlx_error};

const SELECT_SUPPLIER: &str = "SELECT id, name, address, contact FROM suppliers";

#[derive(Debug, Clone)]
pub struct SqliteSupplierStore {
    pool: SqlitePool,
}

impl SqliteSupplierStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SupplierStore for SqliteSupplierStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<Supplier>> {
        let rows = sqlx::query(&format!("{SELECT_SUPPLIER} ORDER BY name"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_suppliers", e))?;

        rows.iter().map(supplier_from_row).collect()
    }

    #[instrument(skip(self), fields(supplier_id = %id), err)]
    async fn get(&self, id: &SupplierId) -> StoreResult<Supplier> {
        let row = sqlx::query(&format!("{SELECT_SUPPLIER} WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_supplier", e))?
            .ok_or(StoreError::NotFound("supplier"))?;

        supplier_from_row(&row)
    }

    #[instrument(skip(self, supplier), fields(supplier_id = %supplier.id), err)]
    async fn insert(&self, supplier: &Supplier) -> StoreResult<()> {
        sqlx::query("INSERT INTO suppliers (id, name, address, contact) VALUES (?, ?, ?, ?)")
            .bind(supplier.id.as_str())
            .bind(&supplier.name)
            .bind(supplier.address.as_deref())
            .bind(supplier.contact.as_deref())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_supplier", e))?;
        Ok(())
    }

    #[instrument(skip(self, supplier), fields(supplier_id = %supplier.id), err)]
    async fn update(&self, supplier: &Supplier) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE suppliers SET name = ?, address = ?, contact = ? WHERE id = ?")
                .bind(&supplier.name)
                .bind(supplier.address.as_deref())
                .bind(supplier.contact.as_deref())
                .bind(supplier.id.as_str())
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("update_supplier", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("supplier"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(supplier_id = %id), err)]
    async fn delete(&self, id: &SupplierId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_supplier", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("supplier"));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct SupplierRow {
    id: String,
    name: String,
    address: Option<String>,
    contact: Option<String>,
}

impl<'r> FromRow<'r, SqliteRow> for SupplierRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(SupplierRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            address: row.try_get("address")?,
            contact: row.try_get("contact")?,
        })
    }
}

fn supplier_from_row(row: &SqliteRow) -> StoreResult<Supplier> {
    let row = SupplierRow::from_row(row).map_err(|e| corrupt("suppliers", e))?;
    Ok(Supplier {
        id: SupplierId::try_from(row.id).map_err(|e| corrupt("suppliers.id", e))?,
        name: row.name,
        address: row.address,
        contact: row.contact,
    })
}
