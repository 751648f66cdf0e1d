use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use tracing::instrument;

use shopfloor_core::{BomItemId, MaterialId, ProjectItemId};
use shopfloor_projects::BomItem;

use super::{BomItemStore, ensure_exists};
use crate::error::{StoreError, StoreResult, corrupt, map_reference_error, map_sqlx_error};

const SELECT_BOM_ITEM: &str = r#"
    SELECT id, item_id, material_id, quantity_per_unit, total_required, allocated, realized
    FROM bom_items
"#;

#[derive(Debug, Clone)]
pub struct SqliteBomItemStore {
    pool: SqlitePool,
}

impl SqliteBomItemStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BomItemStore for SqliteBomItemStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<BomItem>> {
        let rows = sqlx::query(&format!("{SELECT_BOM_ITEM} ORDER BY item_id, id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_bom_items", e))?;

        rows.iter().map(bom_item_from_row).collect()
    }

    #[instrument(skip(self), fields(bom_item_id = %id), err)]
    async fn get(&self, id: &BomItemId) -> StoreResult<BomItem> {
        let row = sqlx::query(&format!("{SELECT_BOM_ITEM} WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_bom_item", e))?
            .ok_or(StoreError::NotFound("bom item"))?;

        bom_item_from_row(&row)
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    async fn list_by_item(&self, item_id: &ProjectItemId) -> StoreResult<Vec<BomItem>> {
        ensure_exists(&self.pool, "project_items", item_id.as_str(), "project item").await?;
        let rows = sqlx::query(&format!("{SELECT_BOM_ITEM} WHERE item_id = ? ORDER BY id"))
            .bind(item_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_bom_items_by_item", e))?;

        rows.iter().map(bom_item_from_row).collect()
    }

    #[instrument(skip(self, bom_item), fields(bom_item_id = %bom_item.id), err)]
    async fn insert(&self, bom_item: &BomItem) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bom_items (
                id, item_id, material_id, quantity_per_unit, total_required, allocated, realized
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(bom_item.id.as_str())
        .bind(bom_item.item_id.as_str())
        .bind(bom_item.material_id.as_str())
        .bind(bom_item.quantity_per_unit)
        .bind(bom_item.total_required)
        .bind(bom_item.allocated)
        .bind(bom_item.realized)
        .execute(&self.pool)
        .await
        .map_err(|e| map_reference_error("insert_bom_item", "itemId and materialId", e))?;
        Ok(())
    }

    #[instrument(skip(self, bom_item), fields(bom_item_id = %bom_item.id), err)]
    async fn update(&self, bom_item: &BomItem) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE bom_items
            SET item_id = ?, material_id = ?, quantity_per_unit = ?, total_required = ?,
                allocated = ?, realized = ?
            WHERE id = ?
            "#,
        )
        .bind(bom_item.item_id.as_str())
        .bind(bom_item.material_id.as_str())
        .bind(bom_item.quantity_per_unit)
        .bind(bom_item.total_required)
        .bind(bom_item.allocated)
        .bind(bom_item.realized)
        .bind(bom_item.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_reference_error("update_bom_item", "itemId and materialId", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("bom item"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(bom_item_id = %id), err)]
    async fn delete(&self, id: &BomItemId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM bom_items WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_bom_item", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("bom item"));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct BomItemRow {
    id: String,
    item_id: String,
    material_id: String,
    quantity_per_unit: i64,
    total_required: i64,
    allocated: i64,
    realized: i64,
}

impl<'r> FromRow<'r, SqliteRow> for BomItemRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(BomItemRow {
            id: row.try_get("id")?,
            item_id: row.try_get("item_id")?,
            material_id: row.try_get("material_id")?,
            quantity_per_unit: row.try_get("quantity_per_unit")?,
            total_required: row.try_get("total_required")?,
            allocated: row.try_get("allocated")?,
            realized: row.try_get("realized")?,
        })
    }
}

fn bom_item_from_row(row: &SqliteRow) -> StoreResult<BomItem> {
    let row = BomItemRow::from_row(row).map_err(|e| corrupt("bom_items", e))?;
    Ok(BomItem {
        id: BomItemId::try_from(row.id).map_err(|e| corrupt("bom_items.id", e))?,
        item_id: ProjectItemId::try_from(row.item_id)
            .map_err(|e| corrupt("bom_items.item_id", e))?,
        material_id: MaterialId::try_from(row.material_id)
            .map_err(|e| corrupt("bom_items.material_id", e))?,
        quantity_per_unit: row.quantity_per_unit,
        total_required: row.total_required,
        allocated: row.allocated,
        realized: row.realized,
    })
}
