//! Production domain module (process steps, per-step counters, sub-assemblies,
//! machines, tasks and the production log).
//!
//! Pure domain logic. Stored JSON is parsed leniently here so that every
//! read path goes through the same recovery rules.

pub mod machine;
pub mod process;
pub mod production_log;
pub mod step_stats;
pub mod sub_assembly;
pub mod task;

pub use machine::{Machine, MachineDraft, MachineStatus, parse_stored_personnel};
pub use process::{ProcessStep, parse_stored_processes};
pub use production_log::{LogType, ProductionLog, ProductionLogDraft, Shift};
pub use step_stats::{StepCounters, StepStats, normalize_step_stats};
pub use sub_assembly::{SubAssembly, SubAssemblyDraft};
pub use task::{Task, TaskDraft, TaskStatus};
