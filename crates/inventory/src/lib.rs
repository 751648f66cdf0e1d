//! Inventory domain module (materials and their stock levels).
//!
//! This crate contains business rules for materials, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod material;

pub use material::{Material, MaterialCategory, MaterialDraft};
