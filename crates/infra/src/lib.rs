//! Infrastructure layer: SQLite connection and schema, record stores, and the
//! services that combine domain logic with storage (receiving, reconciliation).

pub mod db;
pub mod error;
pub mod reconciler;
pub mod receiving;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use reconciler::{ReconcileError, ReconcileReport, StockReconciler};
pub use receiving::ReceivingService;
