use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use tracing::instrument;

use shopfloor_core::{ProjectId, ProjectItemId};
use shopfloor_projects::{FlowType, ProjectItem, parse_stored_assembly_stats};

use super::{ProjectItemStore, ensure_exists};
use crate::error::{StoreError, StoreResult, corrupt, map_reference_error, map_sqlx_error};

const SELECT_ITEM: &str = r#"
    SELECT id, project_id, name, dimensions, thickness, qty_set, quantity, unit, is_bom_locked,
           is_workflow_locked, flow_type, warehouse_qty, shipped_qty, assembly_stats
    FROM project_items
"#;

/// SQLite store for project items. `assembly_stats` is a JSON text column.
#[derive(Debug, Clone)]
pub struct SqliteProjectItemStore {
    pool: SqlitePool,
}

impl SqliteProjectItemStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectItemStore for SqliteProjectItemStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<ProjectItem>> {
        let rows = sqlx::query(&format!("{SELECT_ITEM} ORDER BY project_id, name"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_project_items", e))?;

        rows.iter().map(item_from_row).collect()
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn get(&self, id: &ProjectItemId) -> StoreResult<ProjectItem> {
        let row = sqlx::query(&format!("{SELECT_ITEM} WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_project_item", e))?
            .ok_or(StoreError::NotFound("project item"))?;

        item_from_row(&row)
    }

    #[instrument(skip(self), fields(project_id = %project_id), err)]
    async fn list_by_project(&self, project_id: &ProjectId) -> StoreResult<Vec<ProjectItem>> {
        ensure_exists(&self.pool, "projects", project_id.as_str(), "project").await?;
        let rows = sqlx::query(&format!("{SELECT_ITEM} WHERE project_id = ? ORDER BY name"))
            .bind(project_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_project_items_by_project", e))?;

        rows.iter().map(item_from_row).collect()
    }

    #[instrument(skip(self, item), fields(item_id = %item.id, project_id = %item.project_id), err)]
    async fn insert(&self, item: &ProjectItem) -> StoreResult<()> {
        let assembly_stats = encode_stats(item)?;
        sqlx::query(
            r#"
            INSERT INTO project_items (
                id, project_id, name, dimensions, thickness, qty_set, quantity, unit,
                is_bom_locked, is_workflow_locked, flow_type, warehouse_qty, shipped_qty,
                assembly_stats
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.id.as_str())
        .bind(item.project_id.as_str())
        .bind(&item.name)
        .bind(item.dimensions.as_deref())
        .bind(item.thickness.as_deref())
        .bind(item.qty_set)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(item.is_bom_locked)
        .bind(item.is_workflow_locked)
        .bind(item.flow_type.as_str())
        .bind(item.warehouse_qty)
        .bind(item.shipped_qty)
        .bind(assembly_stats)
        .execute(&self.pool)
        .await
        .map_err(|e| map_reference_error("insert_project_item", "projectId", e))?;
        Ok(())
    }

    #[instrument(skip(self, item), fields(item_id = %item.id), err)]
    async fn update(&self, item: &ProjectItem) -> StoreResult<()> {
        let assembly_stats = encode_stats(item)?;
        let result = sqlx::query(
            r#"
            UPDATE project_items
            SET project_id = ?, name = ?, dimensions = ?, thickness = ?, qty_set = ?,
                quantity = ?, unit = ?, is_bom_locked = ?, is_workflow_locked = ?,
                flow_type = ?, warehouse_qty = ?, shipped_qty = ?, assembly_stats = ?
            WHERE id = ?
            "#,
        )
        .bind(item.project_id.as_str())
        .bind(&item.name)
        .bind(item.dimensions.as_deref())
        .bind(item.thickness.as_deref())
        .bind(item.qty_set)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(item.is_bom_locked)
        .bind(item.is_workflow_locked)
        .bind(item.flow_type.as_str())
        .bind(item.warehouse_qty)
        .bind(item.shipped_qty)
        .bind(assembly_stats)
        .bind(item.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_reference_error("update_project_item", "projectId", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("project item"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn delete(&self, id: &ProjectItemId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM project_items WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_project_item", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("project item"));
        }
        Ok(())
    }
}

fn encode_stats(item: &ProjectItem) -> StoreResult<String> {
    serde_json::to_string(&item.assembly_stats)
        .map_err(|e| StoreError::Validation(format!("assemblyStats: {e}")))
}

#[derive(Debug)]
struct ProjectItemRow {
    id: String,
    project_id: String,
    name: String,
    dimensions: Option<String>,
    thickness: Option<String>,
    qty_set: i64,
    quantity: i64,
    unit: String,
    is_bom_locked: bool,
    is_workflow_locked: bool,
    flow_type: String,
    warehouse_qty: i64,
    shipped_qty: i64,
    assembly_stats: Option<String>,
}

impl<'r> FromRow<'r, SqliteRow> for ProjectItemRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(ProjectItemRow {
            id: row.try_get("id")?,
            project_id: row.try_get("project_id")?,
            name: row.try_get("name")?,
            dimensions: row.try_get("dimensions")?,
            thickness: row.try_get("thickness")?,
            qty_set: row.try_get("qty_set")?,
            quantity: row.try_get("quantity")?,
            unit: row.try_get("unit")?,
            is_bom_locked: row.try_get("is_bom_locked")?,
            is_workflow_locked: row.try_get("is_workflow_locked")?,
            flow_type: row.try_get("flow_type")?,
            warehouse_qty: row.try_get("warehouse_qty")?,
            shipped_qty: row.try_get("shipped_qty")?,
            assembly_stats: row.try_get("assembly_stats")?,
        })
    }
}

fn item_from_row(row: &SqliteRow) -> StoreResult<ProjectItem> {
    let row = ProjectItemRow::from_row(row).map_err(|e| corrupt("project_items", e))?;
    Ok(ProjectItem {
        id: ProjectItemId::try_from(row.id).map_err(|e| corrupt("project_items.id", e))?,
        project_id: ProjectId::try_from(row.project_id)
            .map_err(|e| corrupt("project_items.project_id", e))?,
        name: row.name,
        dimensions: row.dimensions,
        thickness: row.thickness,
        qty_set: row.qty_set,
        quantity: row.quantity,
        unit: row.unit,
        is_bom_locked: row.is_bom_locked,
        is_workflow_locked: row.is_workflow_locked,
        flow_type: row
            .flow_type
            .parse::<FlowType>()
            .map_err(|e| corrupt("project_items.flow_type", e))?,
        warehouse_qty: row.warehouse_qty,
        shipped_qty: row.shipped_qty,
        assembly_stats: row
            .assembly_stats
            .as_deref()
            .map(parse_stored_assembly_stats)
            .unwrap_or_default(),
    })
}
