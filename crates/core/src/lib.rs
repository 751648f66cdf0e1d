//! `shopfloor-core` — shared building blocks for the shop-floor domain crates.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{
    BomItemId, GoodsReceiptId, MachineId, MaterialId, ProductionLogId, ProjectId, ProjectItemId,
    PurchaseOrderId, SubAssemblyId, SupplierId, TaskId,
};
