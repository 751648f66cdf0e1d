use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use tracing::instrument;

use shopfloor_core::{MachineId, ProductionLogId, ProjectId, ProjectItemId, SubAssemblyId, TaskId};
use shopfloor_production::{LogType, ProcessStep, ProductionLog, Shift};

use super::{ProductionLogStore, ensure_exists};
use crate::error::{StoreError, StoreResult, corrupt, map_reference_error, map_sqlx_error};

const SELECT_LOG: &str = r#"
    SELECT id, task_id, machine_id, item_id, sub_assembly_id, project_id, step, shift, good_qty,
           defect_qty, operator, timestamp, log_type
    FROM production_logs
"#;

const LOG_REFERENCES: &str = "taskId, machineId, itemId, subAssemblyId and projectId";

#[derive(Debug, Clone)]
pub struct SqliteProductionLogStore {
    pool: SqlitePool,
}

impl SqliteProductionLogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductionLogStore for SqliteProductionLogStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<ProductionLog>> {
        let rows = sqlx::query(&format!("{SELECT_LOG} ORDER BY timestamp DESC, id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_production_logs", e))?;

        rows.iter().map(log_from_row).collect()
    }

    #[instrument(skip(self), fields(log_id = %id), err)]
    async fn get(&self, id: &ProductionLogId) -> StoreResult<ProductionLog> {
        let row = sqlx::query(&format!("{SELECT_LOG} WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_production_log", e))?
            .ok_or(StoreError::NotFound("production log"))?;

        log_from_row(&row)
    }

    #[instrument(skip(self), fields(task_id = %task_id), err)]
    async fn list_by_task(&self, task_id: &TaskId) -> StoreResult<Vec<ProductionLog>> {
        ensure_exists(&self.pool, "tasks", task_id.as_str(), "task").await?;
        let rows = sqlx::query(&format!(
            "{SELECT_LOG} WHERE task_id = ? ORDER BY timestamp DESC, id"
        ))
        .bind(task_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_production_logs_by_task", e))?;

        rows.iter().map(log_from_row).collect()
    }

    #[instrument(skip(self), fields(project_id = %project_id), err)]
    async fn list_by_project(&self, project_id: &ProjectId) -> StoreResult<Vec<ProductionLog>> {
        ensure_exists(&self.pool, "projects", project_id.as_str(), "project").await?;
        let rows = sqlx::query(&format!(
            "{SELECT_LOG} WHERE project_id = ? ORDER BY timestamp DESC, id"
        ))
        .bind(project_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_production_logs_by_project", e))?;

        rows.iter().map(log_from_row).collect()
    }

    #[instrument(
        skip(self, log),
        fields(log_id = %log.id, task_id = %log.task_id, log_type = log.log_type.as_str()),
        err
    )]
    async fn insert(&self, log: &ProductionLog) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO production_logs (
                id, task_id, machine_id, item_id, sub_assembly_id, project_id, step, shift,
                good_qty, defect_qty, operator, timestamp, log_type
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(log.id.as_str())
        .bind(log.task_id.as_str())
        .bind(log.machine_id.as_ref().map(MachineId::as_str))
        .bind(log.item_id.as_str())
        .bind(log.sub_assembly_id.as_ref().map(SubAssemblyId::as_str))
        .bind(log.project_id.as_str())
        .bind(log.step.as_str())
        .bind(log.shift.as_str())
        .bind(log.good_qty)
        .bind(log.defect_qty)
        .bind(&log.operator)
        .bind(log.timestamp)
        .bind(log.log_type.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_reference_error("insert_production_log", LOG_REFERENCES, e))?;
        Ok(())
    }

    #[instrument(skip(self, log), fields(log_id = %log.id), err)]
    async fn update(&self, log: &ProductionLog) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE production_logs
            SET task_id = ?, machine_id = ?, item_id = ?, sub_assembly_id = ?, project_id = ?,
                step = ?, shift = ?, good_qty = ?, defect_qty = ?, operator = ?, log_type = ?
            WHERE id = ?
            "#,
        )
        .bind(log.task_id.as_str())
        .bind(log.machine_id.as_ref().map(MachineId::as_str))
        .bind(log.item_id.as_str())
        .bind(log.sub_assembly_id.as_ref().map(SubAssemblyId::as_str))
        .bind(log.project_id.as_str())
        .bind(log.step.as_str())
        .bind(log.shift.as_str())
        .bind(log.good_qty)
        .bind(log.defect_qty)
        .bind(&log.operator)
        .bind(log.log_type.as_str())
        .bind(log.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_reference_error("update_production_log", LOG_REFERENCES, e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("production log"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(log_id = %id), err)]
    async fn delete(&self, id: &ProductionLogId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM production_logs WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_production_log", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("production log"));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct ProductionLogRow {
    id: String,
    task_id: String,
    machine_id: Option<String>,
    item_id: String,
    sub_assembly_id: Option<String>,
    project_id: String,
    step: String,
    shift: String,
    good_qty: i64,
    defect_qty: i64,
    operator: String,
    timestamp: DateTime<Utc>,
    log_type: String,
}

impl<'r> FromRow<'r, SqliteRow> for ProductionLogRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(ProductionLogRow {
            id: row.try_get("id")?,
            task_id: row.try_get("task_id")?,
            machine_id: row.try_get("machine_id")?,
            item_id: row.try_get("item_id")?,
            sub_assembly_id: row.try_get("sub_assembly_id")?,
            project_id: row.try_get("project_id")?,
            step: row.try_get("step")?,
            shift: row.try_get("shift")?,
            good_qty: row.try_get("good_qty")?,
            defect_qty: row.try_get("defect_qty")?,
            operator: row.try_get("operator")?,
            timestamp: row.try_get("timestamp")?,
            log_type: row.try_get("log_type")?,
        })
    }
}

fn log_from_row(row: &SqliteRow) -> StoreResult<ProductionLog> {
    let row = ProductionLogRow::from_row(row).map_err(|e| corrupt("production_logs", e))?;
    Ok(ProductionLog {
        id: ProductionLogId::try_from(row.id).map_err(|e| corrupt("production_logs.id", e))?,
        task_id: TaskId::try_from(row.task_id).map_err(|e| corrupt("production_logs.task_id", e))?,
        machine_id: row
            .machine_id
            .map(MachineId::try_from)
            .transpose()
            .map_err(|e| corrupt("production_logs.machine_id", e))?,
        item_id: ProjectItemId::try_from(row.item_id)
            .map_err(|e| corrupt("production_logs.item_id", e))?,
        sub_assembly_id: row
            .sub_assembly_id
            .map(SubAssemblyId::try_from)
            .transpose()
            .map_err(|e| corrupt("production_logs.sub_assembly_id", e))?,
        project_id: ProjectId::try_from(row.project_id)
            .map_err(|e| corrupt("production_logs.project_id", e))?,
        step: row
            .step
            .parse::<ProcessStep>()
            .map_err(|e| corrupt("production_logs.step", e))?,
        shift: row
            .shift
            .parse::<Shift>()
            .map_err(|e| corrupt("production_logs.shift", e))?,
        good_qty: row.good_qty,
        defect_qty: row.defect_qty,
        operator: row.operator,
        timestamp: row.timestamp,
        log_type: row
            .log_type
            .parse::<LogType>()
            .map_err(|e| corrupt("production_logs.log_type", e))?,
    })
}
