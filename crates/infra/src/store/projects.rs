use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use tracing::instrument;

use shopfloor_core::ProjectId;
use shopfloor_projects::{Project, ProjectStatus};

use super::ProjectStore;
use crate::error::{StoreError, StoreResult, corrupt, map_sqlx_error};

const SELECT_PROJECT: &str = r#"
    SELECT id, code, name, customer, start_date, deadline, status, progress, qty_per_unit,
           procurement_qty, total_qty, unit, is_locked
    FROM projects
"#;

#[derive(Debug, Clone)]
pub struct SqliteProjectStore {
    pool: SqlitePool,
}

impl SqliteProjectStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for SqliteProjectStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<Project>> {
        let rows = sqlx::query(&format!("{SELECT_PROJECT} ORDER BY deadline, code"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_projects", e))?;

        rows.iter().map(project_from_row).collect()
    }

    #[instrument(skip(self), fields(project_id = %id), err)]
    async fn get(&self, id: &ProjectId) -> StoreResult<Project> {
        let row = sqlx::query(&format!("{SELECT_PROJECT} WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_project", e))?
            .ok_or(StoreError::NotFound("project"))?;

        project_from_row(&row)
    }

    #[instrument(skip(self, project), fields(project_id = %project.id), err)]
    async fn insert(&self, project: &Project) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO projects (
                id, code, name, customer, start_date, deadline, status, progress, qty_per_unit,
                procurement_qty, total_qty, unit, is_locked
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(project.id.as_str())
        .bind(&project.code)
        .bind(&project.name)
        .bind(&project.customer)
        .bind(project.start_date)
        .bind(project.deadline)
        .bind(project.status.as_str())
        .bind(project.progress)
        .bind(project.qty_per_unit)
        .bind(project.procurement_qty)
        .bind(project.total_qty)
        .bind(&project.unit)
        .bind(project.is_locked)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_project", e))?;
        Ok(())
    }

    #[instrument(skip(self, project), fields(project_id = %project.id), err)]
    async fn update(&self, project: &Project) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET code = ?, name = ?, customer = ?, start_date = ?, deadline = ?, status = ?,
                progress = ?, qty_per_unit = ?, procurement_qty = ?, total_qty = ?, unit = ?,
                is_locked = ?
            WHERE id = ?
            "#,
        )
        .bind(&project.code)
        .bind(&project.name)
        .bind(&project.customer)
        .bind(project.start_date)
        .bind(project.deadline)
        .bind(project.status.as_str())
        .bind(project.progress)
        .bind(project.qty_per_unit)
        .bind(project.procurement_qty)
        .bind(project.total_qty)
        .bind(&project.unit)
        .bind(project.is_locked)
        .bind(project.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_project", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("project"));
        }
        Ok(())
    }

    /// Fails with `Conflict` while items, tasks or logs still reference the
    /// project.
    #[instrument(skip(self), fields(project_id = %id), err)]
    async fn delete(&self, id: &ProjectId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_project", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("project"));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct ProjectRow {
    id: String,
    code: String,
    name: String,
    customer: String,
    start_date: NaiveDate,
    deadline: NaiveDate,
    status: String,
    progress: i64,
    qty_per_unit: i64,
    procurement_qty: i64,
    total_qty: i64,
    unit: String,
    is_locked: bool,
}

impl<'r> FromRow<'r, SqliteRow> for ProjectRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(ProjectRow {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            customer: row.try_get("customer")?,
            start_date: row.try_get("start_date")?,
            deadline: row.try_get("deadline")?,
            status: row.try_get("status")?,
            progress: row.try_get("progress")?,
            qty_per_unit: row.try_get("qty_per_unit")?,
            procurement_qty: row.try_get("procurement_qty")?,
            total_qty: row.try_get("total_qty")?,
            unit: row.try_get("unit")?,
            is_locked: row.try_get("is_locked")?,
        })
    }
}

fn project_from_row(row: &SqliteRow) -> StoreResult<Project> {
    let row = ProjectRow::from_row(row).map_err(|e| corrupt("projects", e))?;
    Ok(Project {
        id: ProjectId::try_from(row.id).map_err(|e| corrupt("projects.id", e))?,
        code: row.code,
        name: row.name,
        customer: row.customer,
        start_date: row.start_date,
        deadline: row.deadline,
        status: row
            .status
            .parse::<ProjectStatus>()
            .map_err(|e| corrupt("projects.status", e))?,
        progress: row.progress,
        qty_per_unit: row.qty_per_unit,
        procurement_qty: row.procurement_qty,
        total_qty: row.total_qty,
        unit: row.unit,
        is_locked: row.is_locked,
    })
}
