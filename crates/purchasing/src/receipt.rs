use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shopfloor_core::error::require_text;
use shopfloor_core::{DomainError, DomainResult, GoodsReceiptId, MaterialId, PurchaseOrderId};

/// One received line of a goods receipt.
///
/// Every field is optional: receipts are often keyed in by hand and may carry
/// only a material name or code instead of the id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_id: Option<MaterialId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_qty: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty: Option<i64>,
}

impl ReceivedLine {
    /// `receivedQty`, falling back to `qty`, falling back to zero.
    pub fn quantity(&self) -> i64 {
        self.received_qty.or(self.qty).unwrap_or(0)
    }
}

/// Record of goods physically received against one purchase order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoodsReceipt {
    pub id: GoodsReceiptId,
    pub code: String,
    pub date: NaiveDate,
    pub po_id: PurchaseOrderId,
    pub items: Vec<ReceivedLine>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoodsReceiptDraft {
    #[serde(default)]
    pub id: Option<GoodsReceiptId>,
    pub code: String,
    pub date: NaiveDate,
    pub po_id: PurchaseOrderId,
    #[serde(default)]
    pub items: Vec<ReceivedLine>,
}

impl GoodsReceiptDraft {
    pub fn into_receipt(self, id: GoodsReceiptId) -> DomainResult<GoodsReceipt> {
        require_text("code", &self.code)?;
        if self.items.is_empty() {
            return Err(DomainError::validation("items must not be empty"));
        }

        Ok(GoodsReceipt {
            id,
            code: self.code,
            date: self.date,
            po_id: self.po_id,
            items: self.items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_prefers_received_qty_then_qty_then_zero() {
        let both = ReceivedLine {
            received_qty: Some(30),
            qty: Some(50),
            ..Default::default()
        };
        assert_eq!(both.quantity(), 30);

        let qty_only = ReceivedLine {
            qty: Some(50),
            ..Default::default()
        };
        assert_eq!(qty_only.quantity(), 50);

        assert_eq!(ReceivedLine::default().quantity(), 0);
    }

    #[test]
    fn receipt_without_lines_is_rejected() {
        let draft = GoodsReceiptDraft {
            id: None,
            code: "GR-1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            po_id: "po1".parse().unwrap(),
            items: vec![],
        };
        assert!(matches!(
            draft.into_receipt("gr1".parse().unwrap()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn receipt_json_round_trips_po_id_and_sparse_lines() {
        let json = serde_json::json!({
            "code": "GR-1",
            "date": "2024-03-05",
            "poId": "po1",
            "items": [{ "materialCode": "STL-01", "receivedQty": 5 }]
        });
        let draft: GoodsReceiptDraft = serde_json::from_value(json).unwrap();
        let receipt = draft.into_receipt("gr1".parse().unwrap()).unwrap();

        let out = serde_json::to_value(&receipt).unwrap();
        assert_eq!(out["poId"], "po1");
        assert_eq!(out["items"][0]["materialCode"], "STL-01");
        assert!(out["items"][0].get("materialId").is_none());
    }
}
