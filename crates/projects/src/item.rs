use core::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use shopfloor_core::error::{require_non_negative, require_text};
use shopfloor_core::{DomainError, DomainResult, ProjectId, ProjectItemId};

/// Free-form per-item assembly counters, stored as a JSON object.
pub type AssemblyStats = Map<String, Value>;

/// Which workflow an item follows on the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowType {
    Old,
    #[default]
    New,
}

impl FlowType {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowType::Old => "OLD",
            FlowType::New => "NEW",
        }
    }
}

impl FromStr for FlowType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OLD" => Ok(FlowType::Old),
            "NEW" => Ok(FlowType::New),
            other => Err(DomainError::validation(format!("unknown flow type '{other}'"))),
        }
    }
}

/// A deliverable of a project; sub-assemblies and BOM lines hang off it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectItem {
    pub id: ProjectItemId,
    pub project_id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub thickness: Option<String>,
    pub qty_set: i64,
    pub quantity: i64,
    pub unit: String,
    pub is_bom_locked: bool,
    pub is_workflow_locked: bool,
    pub flow_type: FlowType,
    pub warehouse_qty: i64,
    pub shipped_qty: i64,
    pub assembly_stats: AssemblyStats,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectItemDraft {
    #[serde(default)]
    pub id: Option<ProjectItemId>,
    pub project_id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub thickness: Option<String>,
    pub qty_set: i64,
    pub quantity: i64,
    pub unit: String,
    #[serde(default)]
    pub is_bom_locked: bool,
    #[serde(default)]
    pub is_workflow_locked: bool,
    #[serde(default)]
    pub flow_type: FlowType,
    #[serde(default)]
    pub warehouse_qty: i64,
    #[serde(default)]
    pub shipped_qty: i64,
    #[serde(default)]
    pub assembly_stats: AssemblyStats,
}

impl ProjectItemDraft {
    pub fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)?;
        require_text("unit", &self.unit)?;
        require_non_negative("qtySet", self.qty_set)?;
        require_non_negative("quantity", self.quantity)?;
        require_non_negative("warehouseQty", self.warehouse_qty)?;
        require_non_negative("shippedQty", self.shipped_qty)?;
        Ok(())
    }

    pub fn into_item(self, id: ProjectItemId) -> DomainResult<ProjectItem> {
        self.validate()?;
        Ok(ProjectItem {
            id,
            project_id: self.project_id,
            name: self.name,
            dimensions: self.dimensions,
            thickness: self.thickness,
            qty_set: self.qty_set,
            quantity: self.quantity,
            unit: self.unit,
            is_bom_locked: self.is_bom_locked,
            is_workflow_locked: self.is_workflow_locked,
            flow_type: self.flow_type,
            warehouse_qty: self.warehouse_qty,
            shipped_qty: self.shipped_qty,
            assembly_stats: self.assembly_stats,
        })
    }
}

/// Parse a stored `assembly_stats` column. Anything that is not a JSON object
/// reads as empty.
pub fn parse_stored_assembly_stats(raw: &str) -> AssemblyStats {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(stats)) => stats,
        Ok(Value::Null) => AssemblyStats::new(),
        Ok(other) => {
            tracing::warn!(stored = %other, "stored assemblyStats is not an object, treating as empty");
            AssemblyStats::new()
        }
        Err(err) => {
            tracing::warn!(error = %err, "stored assemblyStats is not valid JSON, treating as empty");
            AssemblyStats::new()
        }
    }
}
