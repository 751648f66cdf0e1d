use core::str::FromStr;

use serde::{Deserialize, Serialize};

use shopfloor_core::error::{require_non_negative, require_text};
use shopfloor_core::{DomainError, DomainResult, MachineId, ProjectId, ProjectItemId, SubAssemblyId, TaskId};

use crate::process::ProcessStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Paused,
    Completed,
    Downtime,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Paused => "PAUSED",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Downtime => "DOWNTIME",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TaskStatus::Pending),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "PAUSED" => Ok(TaskStatus::Paused),
            "COMPLETED" => Ok(TaskStatus::Completed),
            "DOWNTIME" => Ok(TaskStatus::Downtime),
            other => Err(DomainError::validation(format!("unknown task status '{other}'"))),
        }
    }
}

/// Work order for one process step of a project item, optionally narrowed to
/// one sub-assembly and pinned to one machine.
///
/// Project, item and sub-assembly names are copies taken when the task was
/// written, like the cached material fields on order lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub project_name: String,
    pub item_id: ProjectItemId,
    pub item_name: String,
    #[serde(default)]
    pub sub_assembly_id: Option<SubAssemblyId>,
    #[serde(default)]
    pub sub_assembly_name: Option<String>,
    pub step: ProcessStep,
    #[serde(default)]
    pub machine_id: Option<MachineId>,
    pub target_qty: i64,
    #[serde(default)]
    pub daily_target: Option<i64>,
    pub completed_qty: i64,
    pub defect_qty: i64,
    pub status: TaskStatus,
    #[serde(default)]
    pub note: Option<String>,
    pub total_downtime_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    #[serde(default)]
    pub id: Option<TaskId>,
    pub project_id: ProjectId,
    pub project_name: String,
    pub item_id: ProjectItemId,
    pub item_name: String,
    #[serde(default)]
    pub sub_assembly_id: Option<SubAssemblyId>,
    #[serde(default)]
    pub sub_assembly_name: Option<String>,
    pub step: ProcessStep,
    #[serde(default)]
    pub machine_id: Option<MachineId>,
    pub target_qty: i64,
    #[serde(default)]
    pub daily_target: Option<i64>,
    #[serde(default)]
    pub completed_qty: i64,
    #[serde(default)]
    pub defect_qty: i64,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub total_downtime_minutes: i64,
}

impl TaskDraft {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("projectName", &self.project_name)?;
        require_text("itemName", &self.item_name)?;
        require_non_negative("targetQty", self.target_qty)?;
        if let Some(daily) = self.daily_target {
            require_non_negative("dailyTarget", daily)?;
        }
        require_non_negative("completedQty", self.completed_qty)?;
        require_non_negative("defectQty", self.defect_qty)?;
        require_non_negative("totalDowntimeMinutes", self.total_downtime_minutes)?;
        Ok(())
    }

    pub fn into_task(self, id: TaskId) -> DomainResult<Task> {
        self.validate()?;
        Ok(Task {
            id,
            project_id: self.project_id,
            project_name: self.project_name,
            item_id: self.item_id,
            item_name: self.item_name,
            sub_assembly_id: self.sub_assembly_id,
            sub_assembly_name: self.sub_assembly_name,
            step: self.step,
            machine_id: self.machine_id,
            target_qty: self.target_qty,
            daily_target: self.daily_target,
            completed_qty: self.completed_qty,
            defect_qty: self.defect_qty,
            status: self.status,
            note: self.note,
            total_downtime_minutes: self.total_downtime_minutes,
        })
    }
}
