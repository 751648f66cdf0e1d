use serde::{Deserialize, Serialize};

use shopfloor_core::error::{require_non_negative, require_text};
use shopfloor_core::{DomainResult, MaterialId, ProjectItemId, SubAssemblyId};

use crate::process::ProcessStep;
use crate::step_stats::{StepStats, normalize_step_stats};

/// Intermediate component of a project item, produced through process steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAssembly {
    pub id: SubAssemblyId,
    pub item_id: ProjectItemId,
    pub name: String,
    pub qty_per_parent: i64,
    pub total_needed: i64,
    pub completed_qty: i64,
    pub total_produced: i64,
    pub consumed_qty: i64,
    pub material_id: MaterialId,
    pub processes: Vec<ProcessStep>,
    pub step_stats: StepStats,
    pub is_locked: bool,
}

impl SubAssembly {
    /// Read path: fill in counters for listed steps, no seeding.
    pub fn normalized(mut self) -> Self {
        self.step_stats = normalize_step_stats(self.step_stats, &self.processes, None);
        self
    }

    /// Replace scalar fields from `draft`. Absent `processes` / `stepStats`
    /// keep the current values; the merged stats are normalized without
    /// re-seeding the first step.
    pub fn apply_update(&self, draft: SubAssemblyDraft) -> DomainResult<SubAssembly> {
        draft.validate()?;

        let processes = draft.processes.unwrap_or_else(|| self.processes.clone());
        let current = draft.step_stats.unwrap_or_else(|| self.step_stats.clone());
        let step_stats = normalize_step_stats(current, &processes, None);

        Ok(SubAssembly {
            id: self.id.clone(),
            item_id: draft.item_id,
            name: draft.name,
            qty_per_parent: draft.qty_per_parent,
            total_needed: draft.total_needed,
            completed_qty: draft.completed_qty,
            total_produced: draft.total_produced,
            consumed_qty: draft.consumed_qty,
            material_id: draft.material_id,
            processes,
            step_stats,
            is_locked: draft.is_locked,
        })
    }

    /// Repair pass: fill missing steps and re-seed the first step with
    /// `total_needed`, as on creation.
    pub fn backfilled(mut self) -> Self {
        self.step_stats =
            normalize_step_stats(self.step_stats, &self.processes, Some(self.total_needed));
        self
    }
}

/// Create/update payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAssemblyDraft {
    #[serde(default)]
    pub id: Option<SubAssemblyId>,
    pub item_id: ProjectItemId,
    pub name: String,
    pub qty_per_parent: i64,
    pub total_needed: i64,
    #[serde(default)]
    pub completed_qty: i64,
    #[serde(default)]
    pub total_produced: i64,
    #[serde(default)]
    pub consumed_qty: i64,
    pub material_id: MaterialId,
    #[serde(default)]
    pub processes: Option<Vec<ProcessStep>>,
    #[serde(default)]
    pub step_stats: Option<StepStats>,
    #[serde(default)]
    pub is_locked: bool,
}

impl SubAssemblyDraft {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_non_negative("qtyPerParent", self.qty_per_parent)?;
        require_non_negative("totalNeeded", self.total_needed)?;
        require_non_negative("completedQty", self.completed_qty)?;
        require_non_negative("totalProduced", self.total_produced)?;
        require_non_negative("consumedQty", self.consumed_qty)?;
        if let Some(stats) = &self.step_stats {
            for (step, counters) in stats.iter() {
                require_non_negative(&format!("stepStats.{step}.produced"), counters.produced)?;
                require_non_negative(&format!("stepStats.{step}.available"), counters.available)?;
            }
        }
        Ok(())
    }

    /// Creation path: the first listed step starts with `total_needed` available.
    pub fn into_sub_assembly(self, id: SubAssemblyId) -> DomainResult<SubAssembly> {
        self.validate()?;

        let processes = self.processes.unwrap_or_default();
        let step_stats = normalize_step_stats(
            self.step_stats.unwrap_or_default(),
            &processes,
            Some(self.total_needed),
        );

        Ok(SubAssembly {
            id,
            item_id: self.item_id,
            name: self.name,
            qty_per_parent: self.qty_per_parent,
            total_needed: self.total_needed,
            completed_qty: self.completed_qty,
            total_produced: self.total_produced,
            consumed_qty: self.consumed_qty,
            material_id: self.material_id,
            processes,
            step_stats,
            is_locked: self.is_locked,
        })
    }
}
