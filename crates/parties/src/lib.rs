//! Parties domain module (suppliers that purchase orders are placed with).
//!
//! This crate contains business rules for parties, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod supplier;

pub use supplier::{Supplier, SupplierDraft};
