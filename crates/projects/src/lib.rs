//! Projects domain module (customer projects, their items, and the bill of
//! materials of each item).
//!
//! Pure domain logic: validation and the shape of stored JSON columns. Items
//! are the parents of sub-assemblies in the production crate.

pub mod bom;
pub mod item;
pub mod project;

pub use bom::{BomItem, BomItemDraft};
pub use item::{AssemblyStats, FlowType, ProjectItem, ProjectItemDraft, parse_stored_assembly_stats};
pub use project::{Project, ProjectDraft, ProjectStatus};
