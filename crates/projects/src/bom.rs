use serde::{Deserialize, Serialize};

use shopfloor_core::error::require_non_negative;
use shopfloor_core::{BomItemId, DomainResult, MaterialId, ProjectItemId};

/// One bill-of-materials line: how much of a material one project item needs.
///
/// `allocated` and `realized` are tracked by hand; receiving goods does not
/// touch them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomItem {
    pub id: BomItemId,
    pub item_id: ProjectItemId,
    pub material_id: MaterialId,
    pub quantity_per_unit: i64,
    pub total_required: i64,
    pub allocated: i64,
    pub realized: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomItemDraft {
    #[serde(default)]
    pub id: Option<BomItemId>,
    pub item_id: ProjectItemId,
    pub material_id: MaterialId,
    pub quantity_per_unit: i64,
    pub total_required: i64,
    #[serde(default)]
    pub allocated: i64,
    #[serde(default)]
    pub realized: i64,
}

impl BomItemDraft {
    pub fn into_bom_item(self, id: BomItemId) -> DomainResult<BomItem> {
        require_non_negative("quantityPerUnit", self.quantity_per_unit)?;
        require_non_negative("totalRequired", self.total_required)?;
        require_non_negative("allocated", self.allocated)?;
        require_non_negative("realized", self.realized)?;
        Ok(BomItem {
            id,
            item_id: self.item_id,
            material_id: self.material_id,
            quantity_per_unit: self.quantity_per_unit,
            total_required: self.total_required,
            allocated: self.allocated,
            realized: self.realized,
        })
    }
}
