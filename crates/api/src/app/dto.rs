use serde::{Deserialize, Serialize};

use shopfloor_infra::ReconcileReport;
use shopfloor_inventory::Material;
use shopfloor_production::SubAssembly;
use shopfloor_purchasing::GoodsReceipt;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRequest {
    pub is_locked: bool,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialResponse {
    #[serde(flatten)]
    pub material: Material,
    pub below_safety_stock: bool,
}

impl From<Material> for MaterialResponse {
    fn from(material: Material) -> Self {
        Self {
            below_safety_stock: material.below_safety_stock(),
            material,
        }
    }
}

/// A stored receipt together with what happened to stock.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptCreatedResponse {
    #[serde(flatten)]
    pub receipt: GoodsReceipt,
    pub reconciliation: ReconcileReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockResponse {
    pub message: String,
    pub count: usize,
    pub sub_assemblies: Vec<SubAssembly>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillResponse {
    pub rewritten: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}
