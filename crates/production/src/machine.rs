use core::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use shopfloor_core::error::{require_non_negative, require_text};
use shopfloor_core::{DomainError, DomainResult, MachineId};

use crate::process::ProcessStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineStatus {
    #[default]
    Idle,
    Running,
    Maintenance,
    Offline,
    Downtime,
}

impl MachineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MachineStatus::Idle => "IDLE",
            MachineStatus::Running => "RUNNING",
            MachineStatus::Maintenance => "MAINTENANCE",
            MachineStatus::Offline => "OFFLINE",
            MachineStatus::Downtime => "DOWNTIME",
        }
    }
}

impl FromStr for MachineStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IDLE" => Ok(MachineStatus::Idle),
            "RUNNING" => Ok(MachineStatus::Running),
            "MAINTENANCE" => Ok(MachineStatus::Maintenance),
            "OFFLINE" => Ok(MachineStatus::Offline),
            "DOWNTIME" => Ok(MachineStatus::Downtime),
            other => Err(DomainError::validation(format!(
                "unknown machine status '{other}'"
            ))),
        }
    }
}

/// A machine on the floor. Each machine serves exactly one process step.
///
/// `is_maintenance` is a flag toggled independently of `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: MachineId,
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub machine_type: ProcessStep,
    pub capacity_per_hour: i64,
    pub status: MachineStatus,
    /// Operator names assigned to the machine.
    pub personnel: Vec<String>,
    pub is_maintenance: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineDraft {
    #[serde(default)]
    pub id: Option<MachineId>,
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub machine_type: ProcessStep,
    pub capacity_per_hour: i64,
    #[serde(default)]
    pub status: MachineStatus,
    #[serde(default)]
    pub personnel: Vec<String>,
    #[serde(default)]
    pub is_maintenance: bool,
}

impl MachineDraft {
    pub fn into_machine(self, id: MachineId) -> DomainResult<Machine> {
        require_text("code", &self.code)?;
        require_text("name", &self.name)?;
        require_non_negative("capacityPerHour", self.capacity_per_hour)?;
        Ok(Machine {
            id,
            code: self.code,
            name: self.name,
            machine_type: self.machine_type,
            capacity_per_hour: self.capacity_per_hour,
            status: self.status,
            personnel: self.personnel,
            is_maintenance: self.is_maintenance,
        })
    }
}

/// Parse a stored personnel list; non-string entries are dropped and anything
/// that is not an array reads as empty.
pub fn parse_stored_personnel(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(name),
                other => {
                    tracing::warn!(stored = %other, "dropping non-string personnel entry");
                    None
                }
            })
            .collect(),
        Ok(other) => {
            tracing::warn!(stored = %other, "stored personnel is not an array, treating as empty");
            Vec::new()
        }
        Err(err) => {
            tracing::warn!(error = %err, "stored personnel is not valid JSON, treating as empty");
            Vec::new()
        }
    }
}
