//! SQLite connection pool and schema.

use std::str::FromStr;

pub use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::{StoreResult, map_sqlx_error};

const SCHEMA: &[&str] = &[
    // Stock only changes by `current_stock + delta`; an overflowing sum turns
    // into a REAL, which the typeof check rejects.
    r#"
    CREATE TABLE IF NOT EXISTS materials (
        id             TEXT PRIMARY KEY,
        code           TEXT NOT NULL UNIQUE,
        name           TEXT NOT NULL,
        unit           TEXT NOT NULL,
        current_stock  INTEGER NOT NULL DEFAULT 0 CHECK (typeof(current_stock) = 'integer'),
        safety_stock   INTEGER NOT NULL DEFAULT 0 CHECK (safety_stock >= 0),
        price_per_unit REAL NOT NULL DEFAULT 0 CHECK (price_per_unit >= 0),
        category       TEXT NOT NULL CHECK (category IN ('RAW', 'FINISHING', 'HARDWARE'))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS suppliers (
        id      TEXT PRIMARY KEY,
        name    TEXT NOT NULL,
        address TEXT NULL,
        contact TEXT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS purchase_orders (
        id          TEXT PRIMARY KEY,
        code        TEXT NOT NULL UNIQUE,
        date        TEXT NOT NULL,
        supplier_id TEXT NOT NULL REFERENCES suppliers (id),
        description TEXT NULL,
        items       TEXT NOT NULL DEFAULT '[]',
        status      TEXT NOT NULL DEFAULT 'OPEN' CHECK (status IN ('OPEN', 'RECEIVED')),
        grand_total REAL NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_purchase_orders_supplier_id ON purchase_orders (supplier_id)",
    r#"
    CREATE TABLE IF NOT EXISTS receiving_goods (
        id    TEXT PRIMARY KEY,
        code  TEXT NOT NULL,
        date  TEXT NOT NULL,
        po_id TEXT NOT NULL REFERENCES purchase_orders (id),
        items TEXT NOT NULL DEFAULT '[]'
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_receiving_goods_po_id ON receiving_goods (po_id)",
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id              TEXT PRIMARY KEY,
        code            TEXT NOT NULL UNIQUE,
        name            TEXT NOT NULL,
        customer        TEXT NOT NULL,
        start_date      TEXT NOT NULL,
        deadline        TEXT NOT NULL,
        status          TEXT NOT NULL DEFAULT 'PLANNED'
                        CHECK (status IN ('PLANNED', 'IN_PROGRESS', 'COMPLETED', 'ON_HOLD')),
        progress        INTEGER NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
        qty_per_unit    INTEGER NOT NULL DEFAULT 0,
        procurement_qty INTEGER NOT NULL DEFAULT 0,
        total_qty       INTEGER NOT NULL DEFAULT 0,
        unit            TEXT NOT NULL,
        is_locked       INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS project_items (
        id                 TEXT PRIMARY KEY,
        project_id         TEXT NOT NULL REFERENCES projects (id),
        name               TEXT NOT NULL,
        dimensions         TEXT NULL,
        thickness          TEXT NULL,
        qty_set            INTEGER NOT NULL DEFAULT 0,
        quantity           INTEGER NOT NULL DEFAULT 0,
        unit               TEXT NOT NULL,
        is_bom_locked      INTEGER NOT NULL DEFAULT 0,
        is_workflow_locked INTEGER NOT NULL DEFAULT 0,
        flow_type          TEXT NOT NULL DEFAULT 'NEW' CHECK (flow_type IN ('OLD', 'NEW')),
        warehouse_qty      INTEGER NOT NULL DEFAULT 0,
        shipped_qty        INTEGER NOT NULL DEFAULT 0,
        assembly_stats     TEXT NOT NULL DEFAULT '{}'
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_project_items_project_id ON project_items (project_id)",
    r#"
    CREATE TABLE IF NOT EXISTS sub_assemblies (
        id             TEXT PRIMARY KEY,
        item_id        TEXT NOT NULL REFERENCES project_items (id),
        name           TEXT NOT NULL,
        qty_per_parent INTEGER NOT NULL DEFAULT 0,
        total_needed   INTEGER NOT NULL DEFAULT 0,
        completed_qty  INTEGER NOT NULL DEFAULT 0,
        total_produced INTEGER NOT NULL DEFAULT 0,
        consumed_qty   INTEGER NOT NULL DEFAULT 0,
        material_id    TEXT NOT NULL REFERENCES materials (id),
        processes      TEXT NOT NULL DEFAULT '[]',
        step_stats     TEXT NOT NULL DEFAULT '{}',
        is_locked      INTEGER NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sub_assemblies_item_id ON sub_assemblies (item_id)",
    r#"
    CREATE TABLE IF NOT EXISTS bom_items (
        id                TEXT PRIMARY KEY,
        item_id           TEXT NOT NULL REFERENCES project_items (id),
        material_id       TEXT NOT NULL REFERENCES materials (id),
        quantity_per_unit INTEGER NOT NULL DEFAULT 0,
        total_required    INTEGER NOT NULL DEFAULT 0,
        allocated         INTEGER NOT NULL DEFAULT 0,
        realized          INTEGER NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_bom_items_item_id ON bom_items (item_id)",
    r#"
    CREATE TABLE IF NOT EXISTS machines (
        id                TEXT PRIMARY KEY,
        code              TEXT NOT NULL UNIQUE,
        name              TEXT NOT NULL,
        machine_type      TEXT NOT NULL
                          CHECK (machine_type IN ('POTONG', 'PLONG', 'PRESS', 'LAS', 'PHOSPHATING', 'CAT', 'PACKING')),
        capacity_per_hour INTEGER NOT NULL DEFAULT 0,
        status            TEXT NOT NULL DEFAULT 'IDLE'
                          CHECK (status IN ('IDLE', 'RUNNING', 'MAINTENANCE', 'OFFLINE', 'DOWNTIME')),
        personnel         TEXT NOT NULL DEFAULT '[]',
        is_maintenance    INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id                     TEXT PRIMARY KEY,
        project_id             TEXT NOT NULL REFERENCES projects (id),
        project_name           TEXT NOT NULL,
        item_id                TEXT NOT NULL REFERENCES project_items (id),
        item_name              TEXT NOT NULL,
        sub_assembly_id        TEXT NULL REFERENCES sub_assemblies (id),
        sub_assembly_name      TEXT NULL,
        step                   TEXT NOT NULL
                               CHECK (step IN ('POTONG', 'PLONG', 'PRESS', 'LAS', 'PHOSPHATING', 'CAT', 'PACKING')),
        machine_id             TEXT NULL REFERENCES machines (id),
        target_qty             INTEGER NOT NULL DEFAULT 0,
        daily_target           INTEGER NULL,
        completed_qty          INTEGER NOT NULL DEFAULT 0,
        defect_qty             INTEGER NOT NULL DEFAULT 0,
        status                 TEXT NOT NULL DEFAULT 'PENDING'
                               CHECK (status IN ('PENDING', 'IN_PROGRESS', 'PAUSED', 'COMPLETED', 'DOWNTIME')),
        note                   TEXT NULL,
        total_downtime_minutes INTEGER NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_tasks_project_id ON tasks (project_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_item_id ON tasks (item_id)",
    r#"
    CREATE TABLE IF NOT EXISTS production_logs (
        id              TEXT PRIMARY KEY,
        task_id         TEXT NOT NULL REFERENCES tasks (id),
        machine_id      TEXT NULL REFERENCES machines (id),
        item_id         TEXT NOT NULL REFERENCES project_items (id),
        sub_assembly_id TEXT NULL REFERENCES sub_assemblies (id),
        project_id      TEXT NOT NULL REFERENCES projects (id),
        step            TEXT NOT NULL
                        CHECK (step IN ('POTONG', 'PLONG', 'PRESS', 'LAS', 'PHOSPHATING', 'CAT', 'PACKING')),
        shift           TEXT NOT NULL CHECK (shift IN ('SHIFT_1', 'SHIFT_2', 'SHIFT_3')),
        good_qty        INTEGER NOT NULL DEFAULT 0,
        defect_qty      INTEGER NOT NULL DEFAULT 0,
        operator        TEXT NOT NULL,
        timestamp       TEXT NOT NULL,
        log_type        TEXT NOT NULL
                        CHECK (log_type IN ('OUTPUT', 'DOWNTIME_START', 'DOWNTIME_END', 'WAREHOUSE_ENTRY'))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_production_logs_task_id ON production_logs (task_id)",
    "CREATE INDEX IF NOT EXISTS idx_production_logs_project_id ON production_logs (project_id)",
];

/// Open a pool against `database_url`, creating the file if needed.
///
/// Foreign keys are enforced on every connection.
pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| map_sqlx_error("parse_database_url", e))?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Single-connection in-memory database. Every pooled connection to
/// `sqlite::memory:` is a separate database, so the pool is pinned to one
/// connection that never expires.
pub async fn connect_in_memory() -> StoreResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|e| map_sqlx_error("parse_database_url", e))?
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Create tables and indexes that do not exist yet.
pub async fn init_schema(pool: &SqlitePool) -> StoreResult<()> {
    for statement in SCHEMA {
        sqlx::query(*statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("init_schema", e))?;
    }
    tracing::debug!(statements = SCHEMA.len(), "schema ready");
    Ok(())
}
