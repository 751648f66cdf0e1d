use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};
use tracing::instrument;

use shopfloor_core::MachineId;
use shopfloor_production::{Machine, MachineStatus, ProcessStep, parse_stored_personnel};

use super::MachineStore;
use crate::error::{StoreError, StoreResult, corrupt, map_sqlx_error};

const MACHINE_COLUMNS: &str =
    "id, code, name, machine_type, capacity_per_hour, status, personnel, is_maintenance";

#[derive(Debug, Clone)]
pub struct SqliteMachineStore {
    pool: SqlitePool,
}

impl SqliteMachineStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MachineStore for SqliteMachineStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<Machine>> {
        let rows = sqlx::query(&format!("SELECT {MACHINE_COLUMNS} FROM machines ORDER BY code"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_machines", e))?;

        rows.iter().map(machine_from_row).collect()
    }

    #[instrument(skip(self), fields(machine_id = %id), err)]
    async fn get(&self, id: &MachineId) -> StoreResult<Machine> {
        let row = sqlx::query(&format!("SELECT {MACHINE_COLUMNS} FROM machines WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_machine", e))?
            .ok_or(StoreError::NotFound("machine"))?;

        machine_from_row(&row)
    }

    #[instrument(skip(self, machine), fields(machine_id = %machine.id), err)]
    async fn insert(&self, machine: &Machine) -> StoreResult<()> {
        let personnel = encode_personnel(machine)?;
        sqlx::query(&format!(
            "INSERT INTO machines ({MACHINE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(machine.id.as_str())
        .bind(&machine.code)
        .bind(&machine.name)
        .bind(machine.machine_type.as_str())
        .bind(machine.capacity_per_hour)
        .bind(machine.status.as_str())
        .bind(personnel)
        .bind(machine.is_maintenance)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_machine", e))?;
        Ok(())
    }

    #[instrument(skip(self, machine), fields(machine_id = %machine.id), err)]
    async fn update(&self, machine: &Machine) -> StoreResult<()> {
        let personnel = encode_personnel(machine)?;
        let result = sqlx::query(
            r#"
            UPDATE machines
            SET code = ?, name = ?, machine_type = ?, capacity_per_hour = ?, status = ?,
                personnel = ?, is_maintenance = ?
            WHERE id = ?
            "#,
        )
        .bind(&machine.code)
        .bind(&machine.name)
        .bind(machine.machine_type.as_str())
        .bind(machine.capacity_per_hour)
        .bind(machine.status.as_str())
        .bind(personnel)
        .bind(machine.is_maintenance)
        .bind(machine.id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_machine", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("machine"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(machine_id = %id), err)]
    async fn delete(&self, id: &MachineId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM machines WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_machine", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("machine"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(machine_id = %id), err)]
    async fn toggle_maintenance(&self, id: &MachineId) -> StoreResult<Machine> {
        let row = sqlx::query(&format!(
            "UPDATE machines SET is_maintenance = NOT is_maintenance WHERE id = ? RETURNING {MACHINE_COLUMNS}"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("toggle_machine_maintenance", e))?
        .ok_or(StoreError::NotFound("machine"))?;

        let machine = machine_from_row(&row)?;
        tracing::info!(machine_id = %id, is_maintenance = machine.is_maintenance, "maintenance toggled");
        Ok(machine)
    }
}

fn encode_personnel(machine: &Machine) -> StoreResult<String> {
    serde_json::to_string(&machine.personnel)
        .map_err(|e| StoreError::Validation(format!("personnel: {e}")))
}

#[derive(Debug)]
struct MachineRow {
    id: String,
    code: String,
    name: String,
    machine_type: String,
    capacity_per_hour: i64,
    status: String,
    personnel: Option<String>,
    is_maintenance: bool,
}

impl<'r> FromRow<'r, SqliteRow> for MachineRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(MachineRow {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            machine_type: row.try_get("machine_type")?,
            capacity_per_hour: row.try_get("capacity_per_hour")?,
            status: row.try_get("status")?,
            personnel: row.try_get("personnel")?,
            is_maintenance: row.try_get("is_maintenance")?,
        })
    }
}

fn machine_from_row(row: &SqliteRow) -> StoreResult<Machine> {
    let row = MachineRow::from_row(row).map_err(|e| corrupt("machines", e))?;
    Ok(Machine {
        id: MachineId::try_from(row.id).map_err(|e| corrupt("machines.id", e))?,
        code: row.code,
        name: row.name,
        machine_type: row
            .machine_type
            .parse::<ProcessStep>()
            .map_err(|e| corrupt("machines.machine_type", e))?,
        capacity_per_hour: row.capacity_per_hour,
        status: row
            .status
            .parse::<MachineStatus>()
            .map_err(|e| corrupt("machines.status", e))?,
        personnel: row
            .personnel
            .as_deref()
            .map(parse_stored_personnel)
            .unwrap_or_default(),
        is_maintenance: row.is_maintenance,
    })
}
