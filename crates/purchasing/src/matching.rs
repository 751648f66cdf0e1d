//! Matching received lines to purchase-order lines.
//!
//! Produces a plan of stock deltas; the caller applies it.

use std::collections::BTreeMap;

use serde::Serialize;

use shopfloor_core::MaterialId;

use crate::order::{OrderLine, PurchaseOrder};
use crate::receipt::ReceivedLine;

/// Which key resolved a received line to an order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchedBy {
    MaterialId,
    MaterialName,
    MaterialCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedAdjustment {
    pub line_index: usize,
    pub material_id: MaterialId,
    pub delta: i64,
    pub matched_by: MatchedBy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinePlan {
    Adjust(PlannedAdjustment),
    Unmatched { line_index: usize },
}

fn same(a: Option<&str>, b: Option<&str>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

/// Find the order line a received line refers to.
///
/// Exact material id wins. Otherwise the first order line whose cached name
/// or code equals the received one.
pub fn match_order_line<'a>(
    order_lines: &'a [OrderLine],
    received: &ReceivedLine,
) -> Option<(&'a OrderLine, MatchedBy)> {
    if let Some(id) = &received.material_id {
        if let Some(line) = order_lines.iter().find(|l| &l.material_id == id) {
            return Some((line, MatchedBy::MaterialId));
        }
    }

    order_lines.iter().find_map(|l| {
        if same(l.material_name.as_deref(), received.material_name.as_deref()) {
            Some((l, MatchedBy::MaterialName))
        } else if same(l.material_code.as_deref(), received.material_code.as_deref()) {
            Some((l, MatchedBy::MaterialCode))
        } else {
            None
        }
    })
}

/// One plan entry per received line, in receipt order.
pub fn plan_stock_adjustments(order: &PurchaseOrder, received: &[ReceivedLine]) -> Vec<LinePlan> {
    received
        .iter()
        .enumerate()
        .map(|(line_index, line)| match match_order_line(&order.items, line) {
            Some((order_line, matched_by)) => LinePlan::Adjust(PlannedAdjustment {
                line_index,
                material_id: order_line.material_id.clone(),
                delta: line.quantity(),
                matched_by,
            }),
            None => LinePlan::Unmatched { line_index },
        })
        .collect()
}

/// Net stock change per material implied by a plan. Sums saturate at the
/// `i64` bounds.
pub fn net_deltas(plan: &[LinePlan]) -> BTreeMap<MaterialId, i64> {
    let mut totals = BTreeMap::new();
    for entry in plan {
        if let LinePlan::Adjust(adj) = entry {
            let total: &mut i64 = totals.entry(adj.material_id.clone()).or_insert(0);
            *total = total.saturating_add(adj.delta);
        }
    }
    totals
}
