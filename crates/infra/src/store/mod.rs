//! Record stores.
//!
//! One async trait per record kind, with a SQLite implementation each. Stores
//! return fully-typed domain records; JSON columns are decoded here.

mod bom_items;
mod machines;
mod materials;
mod production_logs;
mod project_items;
mod projects;
mod purchase_orders;
mod receipts;
mod sub_assemblies;
mod suppliers;
mod tasks;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Executor, Sqlite};

use shopfloor_core::{
    BomItemId, GoodsReceiptId, MachineId, MaterialId, ProductionLogId, ProjectId, ProjectItemId,
    PurchaseOrderId, SubAssemblyId, SupplierId, TaskId,
};
use shopfloor_inventory::Material;
use shopfloor_parties::Supplier;
use shopfloor_production::{Machine, ProductionLog, SubAssembly, SubAssemblyDraft, Task};
use shopfloor_projects::{BomItem, Project, ProjectItem};
use shopfloor_purchasing::{GoodsReceipt, PurchaseOrder};

use crate::error::{StoreError, StoreResult, map_sqlx_error};

pub use bom_items::SqliteBomItemStore;
pub use machines::SqliteMachineStore;
pub use materials::SqliteMaterialStore;
pub use production_logs::SqliteProductionLogStore;
pub use project_items::SqliteProjectItemStore;
pub use projects::SqliteProjectStore;
pub use purchase_orders::SqlitePurchaseOrderStore;
pub use receipts::SqliteGoodsReceiptStore;
pub use sub_assemblies::SqliteSubAssemblyStore;
pub use suppliers::SqliteSupplierStore;
pub use tasks::SqliteTaskStore;

#[async_trait]
pub trait MaterialStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Material>>;
    async fn get(&self, id: &MaterialId) -> StoreResult<Material>;
    async fn insert(&self, material: &Material) -> StoreResult<()>;
    async fn update(&self, material: &Material) -> StoreResult<()>;
    async fn delete(&self, id: &MaterialId) -> StoreResult<()>;

    /// Add `delta` to the material's stock in a single statement and return
    /// the resulting stock. This is the only way stock changes. A sum outside
    /// the `i64` range fails with `Validation` and changes nothing.
    async fn adjust_stock(&self, id: &MaterialId, delta: i64) -> StoreResult<i64>;
}

#[async_trait]
pub trait SupplierStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Supplier>>;
    async fn get(&self, id: &SupplierId) -> StoreResult<Supplier>;
    async fn insert(&self, supplier: &Supplier) -> StoreResult<()>;
    async fn update(&self, supplier: &Supplier) -> StoreResult<()>;
    /// `Conflict` while purchase orders still reference the supplier.
    async fn delete(&self, id: &SupplierId) -> StoreResult<()>;
}

#[async_trait]
pub trait PurchaseOrderStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<PurchaseOrder>>;
    async fn get(&self, id: &PurchaseOrderId) -> StoreResult<PurchaseOrder>;
    async fn insert(&self, order: &PurchaseOrder) -> StoreResult<()>;
    async fn update(&self, order: &PurchaseOrder) -> StoreResult<()>;
    async fn delete(&self, id: &PurchaseOrderId) -> StoreResult<()>;
}

#[async_trait]
pub trait GoodsReceiptStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<GoodsReceipt>>;
    async fn get(&self, id: &GoodsReceiptId) -> StoreResult<GoodsReceipt>;
    async fn insert(&self, receipt: &GoodsReceipt) -> StoreResult<()>;
    async fn update(&self, receipt: &GoodsReceipt) -> StoreResult<()>;
    async fn delete(&self, id: &GoodsReceiptId) -> StoreResult<()>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Project>>;
    async fn get(&self, id: &ProjectId) -> StoreResult<Project>;
    async fn insert(&self, project: &Project) -> StoreResult<()>;
    async fn update(&self, project: &Project) -> StoreResult<()>;
    async fn delete(&self, id: &ProjectId) -> StoreResult<()>;
}

#[async_trait]
pub trait ProjectItemStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<ProjectItem>>;
    async fn get(&self, id: &ProjectItemId) -> StoreResult<ProjectItem>;
    /// NotFound when the project itself does not exist.
    async fn list_by_project(&self, project_id: &ProjectId) -> StoreResult<Vec<ProjectItem>>;
    async fn insert(&self, item: &ProjectItem) -> StoreResult<()>;
    async fn update(&self, item: &ProjectItem) -> StoreResult<()>;
    async fn delete(&self, id: &ProjectItemId) -> StoreResult<()>;
}

#[async_trait]
pub trait BomItemStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<BomItem>>;
    async fn get(&self, id: &BomItemId) -> StoreResult<BomItem>;
    async fn list_by_item(&self, item_id: &ProjectItemId) -> StoreResult<Vec<BomItem>>;
    async fn insert(&self, bom_item: &BomItem) -> StoreResult<()>;
    async fn update(&self, bom_item: &BomItem) -> StoreResult<()>;
    async fn delete(&self, id: &BomItemId) -> StoreResult<()>;
}

#[async_trait]
pub trait SubAssemblyStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<SubAssembly>>;
    async fn get(&self, id: &SubAssemblyId) -> StoreResult<SubAssembly>;
    /// NotFound when the project item itself does not exist.
    async fn list_by_item(&self, item_id: &ProjectItemId) -> StoreResult<Vec<SubAssembly>>;
    async fn insert(&self, sub_assembly: &SubAssembly) -> StoreResult<()>;

    /// Read, merge `draft` into the stored record, normalize and write back,
    /// all inside one immediate transaction.
    async fn update(&self, id: &SubAssemblyId, draft: SubAssemblyDraft) -> StoreResult<SubAssembly>;
    async fn delete(&self, id: &SubAssemblyId) -> StoreResult<()>;

    /// Lock or unlock every sub-assembly of a project item and return them.
    /// NotFound when the item does not exist; an item without sub-assemblies
    /// yields an empty list.
    async fn set_locked_for_item(
        &self,
        item_id: &ProjectItemId,
        locked: bool,
    ) -> StoreResult<Vec<SubAssembly>>;

    /// Fill missing step counters and re-seed the first step of every stored
    /// sub-assembly. Returns how many records were rewritten.
    async fn backfill_step_stats(&self) -> StoreResult<usize>;
}

#[async_trait]
pub trait MachineStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Machine>>;
    async fn get(&self, id: &MachineId) -> StoreResult<Machine>;
    async fn insert(&self, machine: &Machine) -> StoreResult<()>;
    async fn update(&self, machine: &Machine) -> StoreResult<()>;
    async fn delete(&self, id: &MachineId) -> StoreResult<()>;

    /// Flip the maintenance flag in one statement and return the machine.
    async fn toggle_maintenance(&self, id: &MachineId) -> StoreResult<Machine>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Task>>;
    async fn get(&self, id: &TaskId) -> StoreResult<Task>;
    async fn list_by_project(&self, project_id: &ProjectId) -> StoreResult<Vec<Task>>;
    async fn list_by_item(&self, item_id: &ProjectItemId) -> StoreResult<Vec<Task>>;
    async fn insert(&self, task: &Task) -> StoreResult<()>;
    async fn update(&self, task: &Task) -> StoreResult<()>;
    async fn delete(&self, id: &TaskId) -> StoreResult<()>;
}

#[async_trait]
pub trait ProductionLogStore: Send + Sync {
    /// Newest first.
    async fn list(&self) -> StoreResult<Vec<ProductionLog>>;
    async fn get(&self, id: &ProductionLogId) -> StoreResult<ProductionLog>;
    async fn list_by_task(&self, task_id: &TaskId) -> StoreResult<Vec<ProductionLog>>;
    async fn list_by_project(&self, project_id: &ProjectId) -> StoreResult<Vec<ProductionLog>>;
    async fn insert(&self, log: &ProductionLog) -> StoreResult<()>;
    /// Rewrites everything except the recorded timestamp.
    async fn update(&self, log: &ProductionLog) -> StoreResult<()>;
    async fn delete(&self, id: &ProductionLogId) -> StoreResult<()>;
}

/// NotFound(`kind`) unless `table` has a row with `id`. Used by the
/// `list_by_*` reads so a missing parent is not reported as "no children".
pub(crate) async fn ensure_exists<'e, E>(
    executor: E,
    table: &'static str,
    id: &str,
    kind: &'static str,
) -> StoreResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let query = format!("SELECT 1 FROM {table} WHERE id = ?");
    sqlx::query(&query)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_sqlx_error("ensure_exists", e))?
        .map(|_| ())
        .ok_or(StoreError::NotFound(kind))
}

#[async_trait]
impl<S> MaterialStore for Arc<S>
where
    S: MaterialStore + ?Sized,
{
    async fn list(&self) -> StoreResult<Vec<Material>> {
        (**self).list().await
    }

    async fn get(&self, id: &MaterialId) -> StoreResult<Material> {
        (**self).get(id).await
    }

    async fn insert(&self, material: &Material) -> StoreResult<()> {
        (**self).insert(material).await
    }

    async fn update(&self, material: &Material) -> StoreResult<()> {
        (**self).update(material).await
    }

    async fn delete(&self, id: &MaterialId) -> StoreResult<()> {
        (**self).delete(id).await
    }

    async fn adjust_stock(&self, id: &MaterialId, delta: i64) -> StoreResult<i64> {
        (**self).adjust_stock(id, delta).await
    }
}

#[async_trait]
impl<S> PurchaseOrderStore for Arc<S>
where
    S: PurchaseOrderStore + ?Sized,
{
    async fn list(&self) -> StoreResult<Vec<PurchaseOrder>> {
        (**self).list().await
    }

    async fn get(&self, id: &PurchaseOrderId) -> StoreResult<PurchaseOrder> {
        (**self).get(id).await
    }

    async fn insert(&self, order: &PurchaseOrder) -> StoreResult<()> {
        (**self).insert(order).await
    }

    async fn update(&self, order: &PurchaseOrder) -> StoreResult<()> {
        (**self).update(order).await
    }

    async fn delete(&self, id: &PurchaseOrderId) -> StoreResult<()> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<S> GoodsReceiptStore for Arc<S>
where
    S: GoodsReceiptStore + ?Sized,
{
    async fn list(&self) -> StoreResult<Vec<GoodsReceipt>> {
        (**self).list().await
    }

    async fn get(&self, id: &GoodsReceiptId) -> StoreResult<GoodsReceipt> {
        (**self).get(id).await
    }

    async fn insert(&self, receipt: &GoodsReceipt) -> StoreResult<()> {
        (**self).insert(receipt).await
    }

    async fn update(&self, receipt: &GoodsReceipt) -> StoreResult<()> {
        (**self).update(receipt).await
    }

    async fn delete(&self, id: &GoodsReceiptId) -> StoreResult<()> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<S> SubAssemblyStore for Arc<S>
where
    S: SubAssemblyStore + ?Sized,
{
    async fn list(&self) -> StoreResult<Vec<SubAssembly>> {
        (**self).list().await
    }

    async fn get(&self, id: &SubAssemblyId) -> StoreResult<SubAssembly> {
        (**self).get(id).await
    }

    async fn list_by_item(&self, item_id: &ProjectItemId) -> StoreResult<Vec<SubAssembly>> {
        (**self).list_by_item(item_id).await
    }

    async fn insert(&self, sub_assembly: &SubAssembly) -> StoreResult<()> {
        (**self).insert(sub_assembly).await
    }

    async fn update(&self, id: &SubAssemblyId, draft: SubAssemblyDraft) -> StoreResult<SubAssembly> {
        (**self).update(id, draft).await
    }

    async fn delete(&self, id: &SubAssemblyId) -> StoreResult<()> {
        (**self).delete(id).await
    }

    async fn set_locked_for_item(
        &self,
        item_id: &ProjectItemId,
        locked: bool,
    ) -> StoreResult<Vec<SubAssembly>> {
        (**self).set_locked_for_item(item_id, locked).await
    }

    async fn backfill_step_stats(&self) -> StoreResult<usize> {
        (**self).backfill_step_stats().await
    }
}

#[async_trait]
impl<S> SupplierStore for Arc<S>
where
    S: SupplierStore + ?Sized,
{
    async fn list(&self) -> StoreResult<Vec<Supplier>> {
        (**self).list().await
    }

    async fn get(&self, id: &SupplierId) -> StoreResult<Supplier> {
        (**self).get(id).await
    }

    async fn insert(&self, supplier: &Supplier) -> StoreResult<()> {
        (**self).insert(supplier).await
    }

    async fn update(&self, supplier: &Supplier) -> StoreResult<()> {
        (**self).update(supplier).await
    }

    async fn delete(&self, id: &SupplierId) -> StoreResult<()> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<S> ProjectStore for Arc<S>
where
    S: ProjectStore + ?Sized,
{
    async fn list(&self) -> StoreResult<Vec<Project>> {
        (**self).list().await
    }

    async fn get(&self, id: &ProjectId) -> StoreResult<Project> {
        (**self).get(id).await
    }

    async fn insert(&self, project: &Project) -> StoreResult<()> {
        (**self).insert(project).await
    }

    async fn update(&self, project: &Project) -> StoreResult<()> {
        (**self).update(project).await
    }

    async fn delete(&self, id: &ProjectId) -> StoreResult<()> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<S> ProjectItemStore for Arc<S>
where
    S: ProjectItemStore + ?Sized,
{
    async fn list(&self) -> StoreResult<Vec<ProjectItem>> {
        (**self).list().await
    }

    async fn get(&self, id: &ProjectItemId) -> StoreResult<ProjectItem> {
        (**self).get(id).await
    }

    async fn list_by_project(&self, project_id: &ProjectId) -> StoreResult<Vec<ProjectItem>> {
        (**self).list_by_project(project_id).await
    }

    async fn insert(&self, item: &ProjectItem) -> StoreResult<()> {
        (**self).insert(item).await
    }

    async fn update(&self, item: &ProjectItem) -> StoreResult<()> {
        (**self).update(item).await
    }

    async fn delete(&self, id: &ProjectItemId) -> StoreResult<()> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<S> BomItemStore for Arc<S>
where
    S: BomItemStore + ?Sized,
{
    async fn list(&self) -> StoreResult<Vec<BomItem>> {
        (**self).list().await
    }

    async fn get(&self, id: &BomItemId) -> StoreResult<BomItem> {
        (**self).get(id).await
    }

    async fn list_by_item(&self, item_id: &ProjectItemId) -> StoreResult<Vec<BomItem>> {
        (**self).list_by_item(item_id).await
    }

    async fn insert(&self, bom_item: &BomItem) -> StoreResult<()> {
        (**self).insert(bom_item).await
    }

    async fn update(&self, bom_item: &BomItem) -> StoreResult<()> {
        (**self).update(bom_item).await
    }

    async fn delete(&self, id: &BomItemId) -> StoreResult<()> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<S> MachineStore for Arc<S>
where
    S: MachineStore + ?Sized,
{
    async fn list(&self) -> StoreResult<Vec<Machine>> {
        (**self).list().await
    }

    async fn get(&self, id: &MachineId) -> StoreResult<Machine> {
        (**self).get(id).await
    }

    async fn insert(&self, machine: &Machine) -> StoreResult<()> {
        (**self).insert(machine).await
    }

    async fn update(&self, machine: &Machine) -> StoreResult<()> {
        (**self).update(machine).await
    }

    async fn delete(&self, id: &MachineId) -> StoreResult<()> {
        (**self).delete(id).await
    }

    async fn toggle_maintenance(&self, id: &MachineId) -> StoreResult<Machine> {
        (**self).toggle_maintenance(id).await
    }
}

#[async_trait]
impl<S> TaskStore for Arc<S>
where
    S: TaskStore + ?Sized,
{
    async fn list(&self) -> StoreResult<Vec<Task>> {
        (**self).list().await
    }

    async fn get(&self, id: &TaskId) -> StoreResult<Task> {
        (**self).get(id).await
    }

    async fn list_by_project(&self, project_id: &ProjectId) -> StoreResult<Vec<Task>> {
        (**self).list_by_project(project_id).await
    }

    async fn list_by_item(&self, item_id: &ProjectItemId) -> StoreResult<Vec<Task>> {
        (**self).list_by_item(item_id).await
    }

    async fn insert(&self, task: &Task) -> StoreResult<()> {
        (**self).insert(task).await
    }

    async fn update(&self, task: &Task) -> StoreResult<()> {
        (**self).update(task).await
    }

    async fn delete(&self, id: &TaskId) -> StoreResult<()> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<S> ProductionLogStore for Arc<S>
where
    S: ProductionLogStore + ?Sized,
{
    async fn list(&self) -> StoreResult<Vec<ProductionLog>> {
        (**self).list().await
    }

    async fn get(&self, id: &ProductionLogId) -> StoreResult<ProductionLog> {
        (**self).get(id).await
    }

    async fn list_by_task(&self, task_id: &TaskId) -> StoreResult<Vec<ProductionLog>> {
        (**self).list_by_task(task_id).await
    }

    async fn list_by_project(&self, project_id: &ProjectId) -> StoreResult<Vec<ProductionLog>> {
        (**self).list_by_project(project_id).await
    }

    async fn insert(&self, log: &ProductionLog) -> StoreResult<()> {
        (**self).insert(log).await
    }

    async fn update(&self, log: &ProductionLog) -> StoreResult<()> {
        (**self).update(log).await
    }

    async fn delete(&self, id: &ProductionLogId) -> StoreResult<()> {
        (**self).delete(id).await
    }
}
