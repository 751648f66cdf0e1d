//! Purchasing domain module (purchase orders, goods receipts, receipt matching).
//!
//! This crate contains business rules for procurement documents, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage). Applying
//! the resulting stock adjustments is the infra layer's job.

pub mod matching;
pub mod order;
pub mod receipt;

pub use matching::{LinePlan, MatchedBy, PlannedAdjustment, match_order_line, net_deltas, plan_stock_adjustments};
pub use order::{OrderLine, OrderLineDraft, PurchaseOrder, PurchaseOrderDraft, PurchaseOrderStatus};
pub use receipt::{GoodsReceipt, GoodsReceiptDraft, ReceivedLine};
