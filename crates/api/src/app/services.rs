use std::sync::Arc;

use shopfloor_infra::db::SqlitePool;

use shopfloor_infra::db::{connect, connect_in_memory, init_schema};
use shopfloor_infra::store::{
    SqliteBomItemStore, SqliteGoodsReceiptStore, SqliteMachineStore, SqliteMaterialStore,
    SqliteProductionLogStore, SqliteProjectItemStore, SqliteProjectStore,
    SqlitePurchaseOrderStore, SqliteSubAssemblyStore, SqliteSupplierStore, SqliteTaskStore,
};
use shopfloor_infra::{ReceivingService, StoreResult};

pub type AppReceivingService = ReceivingService<
    Arc<SqlitePurchaseOrderStore>,
    Arc<SqliteGoodsReceiptStore>,
    Arc<SqliteMaterialStore>,
>;

/// Stores and services shared by every handler.
#[derive(Clone)]
pub struct AppServices {
    pub materials: Arc<SqliteMaterialStore>,
    pub suppliers: Arc<SqliteSupplierStore>,
    pub purchase_orders: Arc<SqlitePurchaseOrderStore>,
    pub receipts: Arc<SqliteGoodsReceiptStore>,
    pub projects: Arc<SqliteProjectStore>,
    pub project_items: Arc<SqliteProjectItemStore>,
    pub bom_items: Arc<SqliteBomItemStore>,
    pub sub_assemblies: Arc<SqliteSubAssemblyStore>,
    pub machines: Arc<SqliteMachineStore>,
    pub tasks: Arc<SqliteTaskStore>,
    pub production_logs: Arc<SqliteProductionLogStore>,
    pub receiving: Arc<AppReceivingService>,
}

impl AppServices {
    pub fn from_pool(pool: SqlitePool) -> Self {
        let materials = Arc::new(SqliteMaterialStore::new(pool.clone()));
        let purchase_orders = Arc::new(SqlitePurchaseOrderStore::new(pool.clone()));
        let receipts = Arc::new(SqliteGoodsReceiptStore::new(pool.clone()));
        let receiving = Arc::new(ReceivingService::new(
            purchase_orders.clone(),
            receipts.clone(),
            materials.clone(),
        ));

        Self {
            materials,
            suppliers: Arc::new(SqliteSupplierStore::new(pool.clone())),
            purchase_orders,
            receipts,
            projects: Arc::new(SqliteProjectStore::new(pool.clone())),
            project_items: Arc::new(SqliteProjectItemStore::new(pool.clone())),
            bom_items: Arc::new(SqliteBomItemStore::new(pool.clone())),
            sub_assemblies: Arc::new(SqliteSubAssemblyStore::new(pool.clone())),
            machines: Arc::new(SqliteMachineStore::new(pool.clone())),
            tasks: Arc::new(SqliteTaskStore::new(pool.clone())),
            production_logs: Arc::new(SqliteProductionLogStore::new(pool)),
            receiving,
        }
    }

    /// Open the database, create missing tables and wire the stores.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = connect(database_url, max_connections).await?;
        init_schema(&pool).await?;
        tracing::info!(database_url, "database ready");
        Ok(Self::from_pool(pool))
    }

    /// Fresh in-memory database (dev/test).
    pub async fn in_memory() -> StoreResult<Self> {
        let pool = connect_in_memory().await?;
        init_schema(&pool).await?;
        Ok(Self::from_pool(pool))
    }
}
