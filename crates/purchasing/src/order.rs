use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shopfloor_core::error::{require_non_negative, require_non_negative_amount, require_text};
use shopfloor_core::{DomainError, DomainResult, MaterialId, PurchaseOrderId, SupplierId};

/// Purchase order status.
///
/// Receiving goods against an order does not move it to `Received`; the status
/// is only changed by editing the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    #[default]
    Open,
    Received,
}

impl PurchaseOrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseOrderStatus::Open => "OPEN",
            PurchaseOrderStatus::Received => "RECEIVED",
        }
    }
}

impl FromStr for PurchaseOrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(PurchaseOrderStatus::Open),
            "RECEIVED" => Ok(PurchaseOrderStatus::Received),
            other => Err(DomainError::validation(format!(
                "unknown purchase order status '{other}'"
            ))),
        }
    }
}

/// Purchase order line item.
///
/// `material_name` / `material_code` are copies of the material's fields taken
/// when the order was written. Receipts that carry no material id are matched
/// against these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub material_id: MaterialId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_code: Option<String>,
    pub qty: i64,
    pub unit_price: f64,
    pub total_price: f64,
}

/// Aggregate: PurchaseOrder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: PurchaseOrderId,
    pub code: String,
    pub date: NaiveDate,
    pub supplier_id: SupplierId,
    #[serde(default)]
    pub description: Option<String>,
    pub items: Vec<OrderLine>,
    pub status: PurchaseOrderStatus,
    pub grand_total: f64,
}

impl PurchaseOrder {
    /// Total quantity ordered for one material across all lines, saturating
    /// at `i64::MAX`.
    pub fn ordered_qty(&self, material_id: &MaterialId) -> i64 {
        self.items
            .iter()
            .filter(|l| &l.material_id == material_id)
            .fold(0i64, |acc, l| acc.saturating_add(l.qty))
    }
}

/// Line payload; `total_price` defaults to `qty * unit_price`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineDraft {
    pub material_id: MaterialId,
    #[serde(default)]
    pub material_name: Option<String>,
    #[serde(default)]
    pub material_code: Option<String>,
    pub qty: i64,
    pub unit_price: f64,
    #[serde(default)]
    pub total_price: Option<f64>,
}

impl OrderLineDraft {
    fn into_line(self, index: usize) -> DomainResult<OrderLine> {
        require_non_negative(&format!("items[{index}].qty"), self.qty)?;
        require_non_negative_amount(&format!("items[{index}].unitPrice"), self.unit_price)?;
        let total_price = self
            .total_price
            .unwrap_or(self.qty as f64 * self.unit_price);
        require_non_negative_amount(&format!("items[{index}].totalPrice"), total_price)?;

        Ok(OrderLine {
            material_id: self.material_id,
            material_name: self.material_name,
            material_code: self.material_code,
            qty: self.qty,
            unit_price: self.unit_price,
            total_price,
        })
    }
}

/// Create/replace payload for a purchase order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderDraft {
    #[serde(default)]
    pub id: Option<PurchaseOrderId>,
    pub code: String,
    pub date: NaiveDate,
    pub supplier_id: SupplierId,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderLineDraft>,
    #[serde(default)]
    pub status: PurchaseOrderStatus,
    /// Defaults to the sum of line totals.
    #[serde(default)]
    pub grand_total: Option<f64>,
}

impl PurchaseOrderDraft {
    pub fn into_order(self, id: PurchaseOrderId) -> DomainResult<PurchaseOrder> {
        require_text("code", &self.code)?;

        let items = self
            .items
            .into_iter()
            .enumerate()
            .map(|(i, l)| l.into_line(i))
            .collect::<DomainResult<Vec<_>>>()?;

        let grand_total = self
            .grand_total
            .unwrap_or_else(|| items.iter().map(|l| l.total_price).sum());
        require_non_negative_amount("grandTotal", grand_total)?;

        Ok(PurchaseOrder {
            id,
            code: self.code,
            date: self.date,
            supplier_id: self.supplier_id,
            description: self.description,
            items,
            status: self.status,
            grand_total,
        })
    }
}
