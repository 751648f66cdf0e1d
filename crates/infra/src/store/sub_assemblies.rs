use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, Sqlite, SqlitePool, Transaction};
use tracing::instrument;

use shopfloor_core::{MaterialId, ProjectItemId, SubAssemblyId};
use shopfloor_production::{StepStats, SubAssembly, SubAssemblyDraft, parse_stored_processes};

use super::SubAssemblyStore;
use super::ensure_exists;
use crate::error::{StoreError, StoreResult, corrupt, map_reference_error, map_sqlx_error};

const SELECT_SUB_ASSEMBLY: &str = r#"
    SELECT id, item_id, name, qty_per_parent, total_needed, completed_qty, total_produced,
           consumed_qty, material_id, processes, step_stats, is_locked
    FROM sub_assemblies
"#;

/// SQLite store for sub-assemblies.
///
/// `processes` and `step_stats` are JSON text columns. They are parsed
/// leniently and normalized on every read, so callers always see counters for
/// each listed step.
#[derive(Debug, Clone)]
pub struct SqliteSubAssemblyStore {
    pool: SqlitePool,
}

impl SqliteSubAssemblyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubAssemblyStore for SqliteSubAssemblyStore {
    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<SubAssembly>> {
        let rows = sqlx::query(&format!("{SELECT_SUB_ASSEMBLY} ORDER BY name"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_sub_assemblies", e))?;

        rows.iter().map(sub_assembly_from_row).collect()
    }

    #[instrument(skip(self), fields(sub_assembly_id = %id), err)]
    async fn get(&self, id: &SubAssemblyId) -> StoreResult<SubAssembly> {
        let row = sqlx::query(&format!("{SELECT_SUB_ASSEMBLY} WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_sub_assembly", e))?
            .ok_or(StoreError::NotFound("sub-assembly"))?;

        sub_assembly_from_row(&row)
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    async fn list_by_item(&self, item_id: &ProjectItemId) -> StoreResult<Vec<SubAssembly>> {
        ensure_exists(&self.pool, "project_items", item_id.as_str(), "project item").await?;
        let rows = sqlx::query(&format!("{SELECT_SUB_ASSEMBLY} WHERE item_id = ? ORDER BY name"))
            .bind(item_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_sub_assemblies_by_item", e))?;

        rows.iter().map(sub_assembly_from_row).collect()
    }

    #[instrument(skip(self, sub_assembly), fields(sub_assembly_id = %sub_assembly.id), err)]
    async fn insert(&self, sub_assembly: &SubAssembly) -> StoreResult<()> {
        let (processes, step_stats) = encode_json_columns(sub_assembly)?;
        sqlx::query(
            r#"
            INSERT INTO sub_assemblies (
                id, item_id, name, qty_per_parent, total_needed, completed_qty,
                total_produced, consumed_qty, material_id, processes, step_stats, is_locked
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sub_assembly.id.as_str())
        .bind(sub_assembly.item_id.as_str())
        .bind(&sub_assembly.name)
        .bind(sub_assembly.qty_per_parent)
        .bind(sub_assembly.total_needed)
        .bind(sub_assembly.completed_qty)
        .bind(sub_assembly.total_produced)
        .bind(sub_assembly.consumed_qty)
        .bind(sub_assembly.material_id.as_str())
        .bind(processes)
        .bind(step_stats)
        .bind(sub_assembly.is_locked)
        .execute(&self.pool)
        .await
        .map_err(|e| map_reference("insert_sub_assembly", e))?;
        Ok(())
    }

    #[instrument(skip(self, draft), fields(sub_assembly_id = %id), err)]
    async fn update(&self, id: &SubAssemblyId, draft: SubAssemblyDraft) -> StoreResult<SubAssembly> {
        let mut tx = begin_immediate(&self.pool).await?;

        let row = sqlx::query(&format!("{SELECT_SUB_ASSEMBLY} WHERE id = ?"))
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("get_sub_assembly", e))?
            .ok_or(StoreError::NotFound("sub-assembly"))?;

        let current = sub_assembly_from_row(&row)?;
        let updated = current.apply_update(draft)?;
        write_sub_assembly(&mut tx, &updated).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(updated)
    }

    #[instrument(skip(self), fields(sub_assembly_id = %id), err)]
    async fn delete(&self, id: &SubAssemblyId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM sub_assemblies WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_sub_assembly", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("sub-assembly"));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %item_id), err)]
    async fn set_locked_for_item(
        &self,
        item_id: &ProjectItemId,
        locked: bool,
    ) -> StoreResult<Vec<SubAssembly>> {
        let mut tx = begin_immediate(&self.pool).await?;

        ensure_exists(&mut *tx, "project_items", item_id.as_str(), "project item").await?;

        let result = sqlx::query("UPDATE sub_assemblies SET is_locked = ? WHERE item_id = ?")
            .bind(locked)
            .bind(item_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_sub_assemblies", e))?;

        let rows = sqlx::query(&format!("{SELECT_SUB_ASSEMBLY} WHERE item_id = ? ORDER BY name"))
            .bind(item_id.as_str())
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("list_sub_assemblies_by_item", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::debug!(locked, updated = result.rows_affected(), "sub-assembly lock applied");
        rows.iter().map(sub_assembly_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn backfill_step_stats(&self) -> StoreResult<usize> {
        let mut tx = begin_immediate(&self.pool).await?;

        let rows = sqlx::query(SELECT_SUB_ASSEMBLY)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("list_sub_assemblies", e))?;

        let mut rewritten = 0;
        for row in &rows {
            let repaired = sub_assembly_from_row(row)?.backfilled();
            write_sub_assembly(&mut tx, &repaired).await?;
            rewritten += 1;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(rewritten, "step stats backfilled");
        Ok(rewritten)
    }
}

/// Takes the write lock at BEGIN, so concurrent read-merge-write paths queue
/// on the busy timeout instead of racing each other.
async fn begin_immediate(pool: &SqlitePool) -> StoreResult<Transaction<'static, Sqlite>> {
    pool.begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(|e| map_sqlx_error("begin_transaction", e))
}

async fn write_sub_assembly(
    tx: &mut Transaction<'_, Sqlite>,
    sub_assembly: &SubAssembly,
) -> StoreResult<()> {
    let (processes, step_stats) = encode_json_columns(sub_assembly)?;
    sqlx::query(
        r#"
        UPDATE sub_assemblies
        SET item_id = ?, name = ?, qty_per_parent = ?, total_needed = ?, completed_qty = ?,
            total_produced = ?, consumed_qty = ?, material_id = ?, processes = ?,
            step_stats = ?, is_locked = ?
        WHERE id = ?
        "#,
    )
    .bind(sub_assembly.item_id.as_str())
    .bind(&sub_assembly.name)
    .bind(sub_assembly.qty_per_parent)
    .bind(sub_assembly.total_needed)
    .bind(sub_assembly.completed_qty)
    .bind(sub_assembly.total_produced)
    .bind(sub_assembly.consumed_qty)
    .bind(sub_assembly.material_id.as_str())
    .bind(processes)
    .bind(step_stats)
    .bind(sub_assembly.is_locked)
    .bind(sub_assembly.id.as_str())
    .execute(&mut **tx)
    .await
    .map_err(|e| map_reference("update_sub_assembly", e))?;
    Ok(())
}

fn map_reference(operation: &str, err: sqlx::Error) -> StoreError {
    map_reference_error(operation, "itemId and materialId", err)
}

fn encode_json_columns(sub_assembly: &SubAssembly) -> StoreResult<(String, String)> {
    let processes = serde_json::to_string(&sub_assembly.processes)
        .map_err(|e| StoreError::Validation(format!("processes: {e}")))?;
    let step_stats = serde_json::to_string(&sub_assembly.step_stats)
        .map_err(|e| StoreError::Validation(format!("stepStats: {e}")))?;
    Ok((processes, step_stats))
}

#[derive(Debug)]
struct SubAssemblyRow {
    id: String,
    item_id: String,
    name: String,
    qty_per_parent: i64,
    total_needed: i64,
    completed_qty: i64,
    total_produced: i64,
    consumed_qty: i64,
    material_id: String,
    processes: Option<String>,
    step_stats: Option<String>,
    is_locked: bool,
}

impl<'r> FromRow<'r, SqliteRow> for SubAssemblyRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(SubAssemblyRow {
            id: row.try_get("id")?,
            item_id: row.try_get("item_id")?,
            name: row.try_get("name")?,
            qty_per_parent: row.try_get("qty_per_parent")?,
            total_needed: row.try_get("total_needed")?,
            completed_qty: row.try_get("completed_qty")?,
            total_produced: row.try_get("total_produced")?,
            consumed_qty: row.try_get("consumed_qty")?,
            material_id: row.try_get("material_id")?,
            processes: row.try_get("processes")?,
            step_stats: row.try_get("step_stats")?,
            is_locked: row.try_get("is_locked")?,
        })
    }
}

fn sub_assembly_from_row(row: &SqliteRow) -> StoreResult<SubAssembly> {
    let row = SubAssemblyRow::from_row(row).map_err(|e| corrupt("sub_assemblies", e))?;

    let processes = row
        .processes
        .as_deref()
        .map(parse_stored_processes)
        .unwrap_or_default();
    let step_stats = row
        .step_stats
        .as_deref()
        .map(StepStats::from_stored)
        .unwrap_or_default();

    let sub_assembly = SubAssembly {
        id: SubAssemblyId::try_from(row.id).map_err(|e| corrupt("sub_assemblies.id", e))?,
        item_id: ProjectItemId::try_from(row.item_id)
            .map_err(|e| corrupt("sub_assemblies.item_id", e))?,
        name: row.name,
        qty_per_parent: row.qty_per_parent,
        total_needed: row.total_needed,
        completed_qty: row.completed_qty,
        total_produced: row.total_produced,
        consumed_qty: row.consumed_qty,
        material_id: MaterialId::try_from(row.material_id)
            .map_err(|e| corrupt("sub_assemblies.material_id", e))?,
        processes,
        step_stats,
        is_locked: row.is_locked,
    };
    Ok(sub_assembly.normalized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::{seed_material, seed_project_item, test_pool};
    use shopfloor_production::{ProcessStep, StepCounters};

    fn test_draft(item: &str, name: &str) -> SubAssemblyDraft {
        SubAssemblyDraft {
            id: None,
            item_id: item.parse().unwrap(),
            name: name.to_string(),
            qty_per_parent: 2,
            total_needed: 200,
            completed_qty: 0,
            total_produced: 0,
            consumed_qty: 0,
            material_id: "mat1".parse().unwrap(),
            processes: Some(vec![ProcessStep::Potong, ProcessStep::Plong]),
            step_stats: None,
            is_locked: false,
        }
    }

    /// Store over a database holding material `mat1` and items `item1`..`item3`.
    async fn test_store() -> (SqlitePool, SqliteSubAssemblyStore) {
        let pool = test_pool().await;
        seed_material(&pool, "mat1").await;
        for item in ["item1", "item2", "item3"] {
            seed_project_item(&pool, item).await;
        }
        (pool.clone(), SqliteSubAssemblyStore::new(pool))
    }

    async fn seed(store: &SqliteSubAssemblyStore, id: &str, item: &str) -> SubAssembly {
        let sa = test_draft(item, &format!("Part {id}"))
            .into_sub_assembly(id.parse().unwrap())
            .unwrap();
        store.insert(&sa).await.unwrap();
        sa
    }

    #[tokio::test]
    async fn created_sub_assembly_reads_back_seeded() {
        let (_, store) = test_store().await;
        let sa = seed(&store, "sa1", "item1").await;

        let stored = store.get(&sa.id).await.unwrap();
        assert_eq!(stored, sa);
        assert_eq!(
            stored.step_stats.get(ProcessStep::Potong),
            Some(&StepCounters {
                produced: 0,
                available: 200
            })
        );
    }

    #[tokio::test]
    async fn update_merges_inside_transaction_without_reseeding() {
        let (_, store) = test_store().await;
        seed(&store, "sa1", "item1").await;

        let mut progress = test_draft("item1", "Part sa1");
        progress.step_stats = Some(
            [(
                ProcessStep::Potong,
                StepCounters {
                    produced: 50,
                    available: 150,
                },
            )]
            .into_iter()
            .collect(),
        );
        store.update(&"sa1".parse().unwrap(), progress).await.unwrap();

        let mut rename = test_draft("item1", "Renamed");
        rename.processes = Some(vec![ProcessStep::Potong, ProcessStep::Plong, ProcessStep::Las]);
        rename.total_needed = 999;
        let updated = store.update(&"sa1".parse().unwrap(), rename).await.unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(
            updated.step_stats.get(ProcessStep::Potong),
            Some(&StepCounters {
                produced: 50,
                available: 150
            })
        );
        assert_eq!(
            updated.step_stats.get(ProcessStep::Las),
            Some(&StepCounters::default())
        );
        assert_eq!(store.get(&"sa1".parse().unwrap()).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn concurrent_updates_on_a_file_database_all_commit() {
        let dir = std::env::temp_dir().join(format!("shopfloor-sa-{}", SubAssemblyId::generate()));
        std::fs::create_dir_all(&dir).unwrap();
        let url = format!("sqlite://{}", dir.join("db.sqlite").display());
        let pool = crate::db::connect(&url, 4).await.unwrap();
        crate::db::init_schema(&pool).await.unwrap();
        seed_material(&pool, "mat1").await;
        seed_project_item(&pool, "item1").await;
        let store = std::sync::Arc::new(SqliteSubAssemblyStore::new(pool));
        seed(&store, "sa1", "item1").await;

        let mut handles = Vec::new();
        for n in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut draft = test_draft("item1", &format!("Rev {n}"));
                draft.completed_qty = n;
                store.update(&"sa1".parse().unwrap(), draft).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let stored = store.get(&"sa1".parse().unwrap()).await.unwrap();
        assert!(stored.name.starts_with("Rev "));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn update_of_missing_sub_assembly_is_not_found() {
        let (_, store) = test_store().await;
        let err = store
            .update(&"ghost".parse().unwrap(), test_draft("item1", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("sub-assembly")));
    }

    #[tokio::test]
    async fn malformed_stored_columns_are_recovered_on_read() {
        let (pool, store) = test_store().await;
        seed(&store, "sa1", "item1").await;
        sqlx::query(
            r#"UPDATE sub_assemblies
               SET processes = '["POTONG", "GRINDING"]', step_stats = '"garbage"'
               WHERE id = 'sa1'"#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let sa = store.get(&"sa1".parse().unwrap()).await.unwrap();
        assert_eq!(sa.processes, vec![ProcessStep::Potong]);
        assert_eq!(sa.step_stats.get(ProcessStep::Potong), Some(&StepCounters::default()));
        assert_eq!(sa.step_stats.len(), 1);
    }

    #[tokio::test]
    async fn lock_by_item_touches_only_that_item() {
        let (_, store) = test_store().await;
        seed(&store, "sa1", "item1").await;
        seed(&store, "sa2", "item1").await;
        seed(&store, "sa3", "item2").await;

        let locked = store
            .set_locked_for_item(&"item1".parse().unwrap(), true)
            .await
            .unwrap();
        assert_eq!(locked.len(), 2);
        assert!(locked.iter().all(|sa| sa.is_locked));
        assert!(!store.get(&"sa3".parse().unwrap()).await.unwrap().is_locked);
    }

    #[tokio::test]
    async fn lock_distinguishes_missing_item_from_item_without_sub_assemblies() {
        let (_, store) = test_store().await;

        let none = store
            .set_locked_for_item(&"item3".parse().unwrap(), true)
            .await
            .unwrap();
        assert!(none.is_empty());

        let err = store
            .set_locked_for_item(&"item9".parse().unwrap(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound("project item")));
        assert!(matches!(
            store.list_by_item(&"item9".parse().unwrap()).await,
            Err(StoreError::NotFound("project item"))
        ));
        assert!(store.list_by_item(&"item3".parse().unwrap()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn backfill_reseeds_every_record() {
        let (pool, store) = test_store().await;
        seed(&store, "sa1", "item1").await;
        seed(&store, "sa2", "item2").await;
        sqlx::query("UPDATE sub_assemblies SET step_stats = '{}', total_needed = 40")
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(store.backfill_step_stats().await.unwrap(), 2);

        for sa in store.list().await.unwrap() {
            assert_eq!(sa.step_stats.get(ProcessStep::Potong).map(|c| c.available), Some(40));
            assert_eq!(sa.step_stats.get(ProcessStep::Plong), Some(&StepCounters::default()));
        }
    }

    #[tokio::test]
    async fn unknown_references_are_validation_errors() {
        let (_, store) = test_store().await;

        let mut draft = test_draft("item1", "x");
        draft.material_id = "m404".parse().unwrap();
        let sa = draft.into_sub_assembly("sa1".parse().unwrap()).unwrap();
        assert!(matches!(store.insert(&sa).await, Err(StoreError::Validation(_))));

        let orphan = test_draft("item404", "x")
            .into_sub_assembly("sa2".parse().unwrap())
            .unwrap();
        assert!(matches!(store.insert(&orphan).await, Err(StoreError::Validation(_))));
    }
}
