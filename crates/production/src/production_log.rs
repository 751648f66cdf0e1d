use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfloor_core::error::{require_non_negative, require_text};
use shopfloor_core::{
    DomainError, DomainResult, MachineId, ProductionLogId, ProjectId, ProjectItemId,
    SubAssemblyId, TaskId,
};

use crate::process::ProcessStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shift {
    #[serde(rename = "SHIFT_1")]
    First,
    #[serde(rename = "SHIFT_2")]
    Second,
    #[serde(rename = "SHIFT_3")]
    Third,
}

impl Shift {
    pub fn as_str(self) -> &'static str {
        match self {
            Shift::First => "SHIFT_1",
            Shift::Second => "SHIFT_2",
            Shift::Third => "SHIFT_3",
        }
    }
}

impl FromStr for Shift {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SHIFT_1" => Ok(Shift::First),
            "SHIFT_2" => Ok(Shift::Second),
            "SHIFT_3" => Ok(Shift::Third),
            other => Err(DomainError::validation(format!("unknown shift '{other}'"))),
        }
    }
}

/// What a log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogType {
    /// Good and defect pieces produced.
    Output,
    DowntimeStart,
    DowntimeEnd,
    /// Finished pieces handed to the warehouse.
    WarehouseEntry,
}

impl LogType {
    pub fn as_str(self) -> &'static str {
        match self {
            LogType::Output => "OUTPUT",
            LogType::DowntimeStart => "DOWNTIME_START",
            LogType::DowntimeEnd => "DOWNTIME_END",
            LogType::WarehouseEntry => "WAREHOUSE_ENTRY",
        }
    }
}

impl FromStr for LogType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OUTPUT" => Ok(LogType::Output),
            "DOWNTIME_START" => Ok(LogType::DowntimeStart),
            "DOWNTIME_END" => Ok(LogType::DowntimeEnd),
            "WAREHOUSE_ENTRY" => Ok(LogType::WarehouseEntry),
            other => Err(DomainError::validation(format!("unknown log type '{other}'"))),
        }
    }
}

/// One shop-floor event against a task.
///
/// Logs are a journal: recording one does not change the task's counters or
/// the sub-assembly's step stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionLog {
    pub id: ProductionLogId,
    pub task_id: TaskId,
    #[serde(default)]
    pub machine_id: Option<MachineId>,
    pub item_id: ProjectItemId,
    #[serde(default)]
    pub sub_assembly_id: Option<SubAssemblyId>,
    pub project_id: ProjectId,
    pub step: ProcessStep,
    pub shift: Shift,
    pub good_qty: i64,
    pub defect_qty: i64,
    pub operator: String,
    /// Set when the entry is first recorded; edits keep it.
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub log_type: LogType,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionLogDraft {
    #[serde(default)]
    pub id: Option<ProductionLogId>,
    pub task_id: TaskId,
    #[serde(default)]
    pub machine_id: Option<MachineId>,
    pub item_id: ProjectItemId,
    #[serde(default)]
    pub sub_assembly_id: Option<SubAssemblyId>,
    pub project_id: ProjectId,
    pub step: ProcessStep,
    pub shift: Shift,
    #[serde(default)]
    pub good_qty: i64,
    #[serde(default)]
    pub defect_qty: i64,
    pub operator: String,
    #[serde(rename = "type")]
    pub log_type: LogType,
}

impl ProductionLogDraft {
    pub fn into_log(self, id: ProductionLogId, timestamp: DateTime<Utc>) -> DomainResult<ProductionLog> {
        require_non_negative("goodQty", self.good_qty)?;
        require_non_negative("defectQty", self.defect_qty)?;
        require_text("operator", &self.operator)?;
        Ok(ProductionLog {
            id,
            task_id: self.task_id,
            machine_id: self.machine_id,
            item_id: self.item_id,
            sub_assembly_id: self.sub_assembly_id,
            project_id: self.project_id,
            step: self.step,
            shift: self.shift,
            good_qty: self.good_qty,
            defect_qty: self.defect_qty,
            operator: self.operator,
            timestamp,
            log_type: self.log_type,
        })
    }
}
