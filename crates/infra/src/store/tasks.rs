use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use tracing::instrument;

use shopfloor_core::{MachineId, ProjectId, ProjectItemId, SubAssemblyId, TaskId};
use shopfloor_production::{ProcessStep, Task, TaskStatus};

use super::{TaskStore, ensure_exists};
use crate::error::{StoreError, StoreResult, corrupt, map_reference_error, map_sqlx_error};

const SELECT_TASK: &str = r#"
    SELECT id, project_id, project_name, item_id, item_name, sub_assembly_id, sub_assembly_name,
           step, machine_id, target_qty, daily_target, completed_qty, defect_qty, status, note,
           total_downtime_minutes
    FROM tasks
"#;

const TASK_REFERENCES: &str = "projectId, itemId, subAssemblyId and machineId";

/// SQLite store for production tasks.
///
/// Project, item and sub-assembly names are denormalized copies written by
/// the client; they are stored as given.
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query(&format!("{SELECT_TASK} ORDER BY project_id, item_id, id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_tasks", e))?;

        rows.iter().map(task_from_row).collect()
    }

    #[instrument(skip(self), fields(task_id = %id), err)]
    async fn get(&self, id: &TaskId) -> StoreResult<Task> {
        let row = sqlx::query(&format!("{SELECT_TASK} WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_task", e))?
            .ok_or(StoreError::NotFound("task"))?;

        task_from_row(&row)
    }

    #[instrument(skip(self), fields(project_id = %project_id), err)]
    async fn list_by_project(&self, project_id: &ProjectId) -> StoreResult<Vec<Task>> {
        ensure_exists(&self.pool, "projects", project_id.as_str(), "project").await?;
        let rows = sqlx::query(&format!("{SELECT_TASK} WHERE project_id = ? ORDER BY item_id, id"))
            .bind(project_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_tasks_by_project", e))?;

        rows.iter().map(task_from_row).collect()
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    async fn list_by_item(&self, item_id: &ProjectItemId) -> StoreResult<Vec<Task>> {
        ensure_exists(&self.pool, "project_items", item_id.as_str(), "project item").await?;
        let rows = sqlx::query(&format!("{SELECT_TASK} WHERE item_id = ? ORDER BY id"))
            .bind(item_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_tasks_by_item", e))?;

        rows.iter().map(task_from_row).collect()
    }

    #[instrument(skip(self, task), fields(task_id = %task.id, step = task.step.as_str()), err)]
    async fn insert(&self, task: &Task) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, project_id, project_name, item_id, item_name, sub_assembly_id,
                sub_assembly_name, step, machine_id, target_qty, daily_target, completed_qty,
                defect_qty, status, note, total_downtime_minutes
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(task.id.as_str())
        .bind(task.project_id.as_str())
        .bind(&task.project_name)
        .bind(task.item_id.as_str())
        .bind(&task.item_name)
        .bind(task.sub_assembly_id.as_ref().map(SubAssemblyId::as_str))
        .bind(task.sub_assembly_name.as_deref())
        .bind(task.step.as_str())
        .bind(task.machine_id.as_ref().map(MachineId::as_str))
        .bind(task.target_qty)
        .bind(task.daily_target)
        .bind(task.completed_qty)
        .bind(task.defect_qty)
        .bind(task.status.as_str())
        .bind(task.note.as_deref())
        .bind(task.total_downtime_minutes)
        .execute(&self.pool)
        .await
        .map_err(|e| map_reference_error("insert_task", TASK_REFERENCES, e))?;
        Ok(())
    }

    #[instrument(skip(self, task), fields(task_id = %task.id, status = task.status.as_str()), err)]
    async fn update(&self, task: &Task) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET project_id = ?, project_name = ?, item_id = ?, item_name = ?,
                sub_assembly_id = ?, sub_assembly_name = ?, step = ?, machine_id = ?,
                target_qty = ?, daily_target = ?, completed_qty = ?, defect_qty = ?,
                status = ?, note = ?, total_downtime_minutes = ?
            WHERE id = ?
            "#,
        )
        .bind(task.project_id.as_str())
        .bind(&task.project_name)
        .bind(task.item_id.as_str())
        .bind(&task.item_name)
        .bind(task.sub_assembly_id.as_ref().map(SubAssemblyId::as_str))
        .bind(task.sub_assembly_name.as_deref())
        .bind(task.step.as_str())
        .bind(task.machine_id.as_ref().map(MachineId::as_str))
        .bind(task.target_qty)
        .bind(task.daily_target)
        .bind(task.completed_qty)
        .bind(task.defect_qty)
        .bind(task.status.as_str())
        .bind(task.note.as_deref())
        .bind(task.total_downtime_minutes)
        .bind(task.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_reference_error("update_task", TASK_REFERENCES, e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("task"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(task_id = %id), err)]
    async fn delete(&self, id: &TaskId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_task", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("task"));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct TaskRow {
    id: String,
    project_id: String,
    project_name: String,
    item_id: String,
    item_name: String,
    sub_assembly_id: Option<String>,
    sub_assembly_name: Option<String>,
    step: String,
    machine_id: Option<String>,
    target_qty: i64,
    daily_target: Option<i64>,
    completed_qty: i64,
    defect_qty: i64,
    status: String,
    note: Option<String>,
    total_downtime_minutes: i64,
}

impl<'r> FromRow<'r, SqliteRow> for TaskRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(TaskRow {
            id: row.try_get("id")?,
            project_id: row.try_get("project_id")?,
            project_name: row.try_get("project_name")?,
            item_id: row.try_get("item_id")?,
            item_name: row.try_get("item_name")?,
            sub_assembly_id: row.try_get("sub_assembly_id")?,
            sub_assembly_name: row.try_get("sub_assembly_name")?,
            step: row.try_get("step")?,
            machine_id: row.try_get("machine_id")?,
            target_qty: row.try_get("target_qty")?,
            daily_target: row.try_get("daily_target")?,
            completed_qty: row.try_get("completed_qty")?,
            defect_qty: row.try_get("defect_qty")?,
            status: row.try_get("status")?,
            note: row.try_get("note")?,
            total_downtime_minutes: row.try_get("total_downtime_minutes")?,
        })
    }
}

fn task_from_row(row: &SqliteRow) -> StoreResult<Task> {
    let row = TaskRow::from_row(row).map_err(|e| corrupt("tasks", e))?;
    Ok(Task {
        id: TaskId::try_from(row.id).map_err(|e| corrupt("tasks.id", e))?,
        project_id: ProjectId::try_from(row.project_id)
            .map_err(|e| corrupt("tasks.project_id", e))?,
        project_name: row.project_name,
        item_id: ProjectItemId::try_from(row.item_id).map_err(|e| corrupt("tasks.item_id", e))?,
        item_name: row.item_name,
        sub_assembly_id: row
            .sub_assembly_id
            .map(SubAssemblyId::try_from)
            .transpose()
            .map_err(|e| corrupt("tasks.sub_assembly_id", e))?,
        sub_assembly_name: row.sub_assembly_name,
        step: row
            .step
            .parse::<ProcessStep>()
            .map_err(|e| corrupt("tasks.step", e))?,
        machine_id: row
            .machine_id
            .map(MachineId::try_from)
            .transpose()
            .map_err(|e| corrupt("tasks.machine_id", e))?,
        target_qty: row.target_qty,
        daily_target: row.daily_target,
        completed_qty: row.completed_qty,
        defect_qty: row.defect_qty,
        status: row
            .status
            .parse::<TaskStatus>()
            .map_err(|e| corrupt("tasks.status", e))?,
        note: row.note,
        total_downtime_minutes: row.total_downtime_minutes,
    })
}
