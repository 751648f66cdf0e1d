use core::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shopfloor_core::error::{require_non_negative, require_text};
use shopfloor_core::{DomainError, DomainResult, ProjectId};

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
    OnHold,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Planned => "PLANNED",
            ProjectStatus::InProgress => "IN_PROGRESS",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::OnHold => "ON_HOLD",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PLANNED" => Ok(ProjectStatus::Planned),
            "IN_PROGRESS" => Ok(ProjectStatus::InProgress),
            "COMPLETED" => Ok(ProjectStatus::Completed),
            "ON_HOLD" => Ok(ProjectStatus::OnHold),
            other => Err(DomainError::validation(format!(
                "unknown project status '{other}'"
            ))),
        }
    }
}

/// A customer order being manufactured.
///
/// `progress` is a percentage maintained by the client; nothing here derives
/// it from item or task state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub code: String,
    pub name: String,
    pub customer: String,
    pub start_date: NaiveDate,
    pub deadline: NaiveDate,
    pub status: ProjectStatus,
    pub progress: i64,
    pub qty_per_unit: i64,
    pub procurement_qty: i64,
    pub total_qty: i64,
    pub unit: String,
    pub is_locked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    #[serde(default)]
    pub id: Option<ProjectId>,
    pub code: String,
    pub name: String,
    pub customer: String,
    pub start_date: NaiveDate,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub progress: i64,
    pub qty_per_unit: i64,
    pub procurement_qty: i64,
    pub total_qty: i64,
    pub unit: String,
    #[serde(default)]
    pub is_locked: bool,
}

impl ProjectDraft {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("code", &self.code)?;
        require_text("name", &self.name)?;
        require_text("customer", &self.customer)?;
        require_text("unit", &self.unit)?;
        if !(0..=100).contains(&self.progress) {
            return Err(DomainError::validation(
                "progress must be an integer between 0 and 100",
            ));
        }
        require_non_negative("qtyPerUnit", self.qty_per_unit)?;
        require_non_negative("procurementQty", self.procurement_qty)?;
        require_non_negative("totalQty", self.total_qty)?;
        Ok(())
    }

    pub fn into_project(self, id: ProjectId) -> DomainResult<Project> {
        self.validate()?;
        Ok(Project {
            id,
            code: self.code,
            name: self.name,
            customer: self.customer,
            start_date: self.start_date,
            deadline: self.deadline,
            status: self.status,
            progress: self.progress,
            qty_per_unit: self.qty_per_unit,
            procurement_qty: self.procurement_qty,
            total_qty: self.total_qty,
            unit: self.unit,
            is_locked: self.is_locked,
        })
    }
}
