//! Stock reconciliation for goods receipts.
//!
//! Each received line is matched to a line of the referenced purchase order
//! and the matched material's stock is moved by the received quantity. Lines
//! are applied one by one: a line that does not match, or whose stock write
//! fails, is logged and skipped while the rest still apply.

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use shopfloor_core::{MaterialId, PurchaseOrderId};
use shopfloor_purchasing::{
    LinePlan, MatchedBy, PurchaseOrder, ReceivedLine, net_deltas, plan_stock_adjustments,
};

use crate::error::StoreError;
use crate::store::{MaterialStore, PurchaseOrderStore};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("purchase order {0} not found")]
    OrderNotFound(PurchaseOrderId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedAdjustment {
    pub line_index: usize,
    pub material_id: MaterialId,
    pub delta: i64,
    pub matched_by: MatchedBy,
    pub resulting_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedLine {
    pub line_index: usize,
    pub line: ReceivedLineKey,
}

/// Identifying fields of a received line, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedLineKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_id: Option<MaterialId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_code: Option<String>,
}

impl From<&ReceivedLine> for ReceivedLineKey {
    fn from(line: &ReceivedLine) -> Self {
        ReceivedLineKey {
            material_id: line.material_id.clone(),
            material_name: line.material_name.clone(),
            material_code: line.material_code.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedAdjustment {
    pub line_index: usize,
    pub material_id: MaterialId,
    pub delta: i64,
    pub reason: String,
}

/// Per-line outcome of one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub applied: Vec<AppliedAdjustment>,
    pub unmatched: Vec<UnmatchedLine>,
    pub failed: Vec<FailedAdjustment>,
}

impl ReconcileReport {
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty() && self.failed.is_empty()
    }
}

/// Applies received quantities to material stock.
#[derive(Debug, Clone)]
pub struct StockReconciler<O, M> {
    orders: O,
    materials: M,
}

impl<O, M> StockReconciler<O, M>
where
    O: PurchaseOrderStore,
    M: MaterialStore,
{
    pub fn new(orders: O, materials: M) -> Self {
        Self { orders, materials }
    }

    /// Load the order and apply `lines` against it.
    ///
    /// A missing order aborts before any stock is touched.
    #[instrument(skip(self, lines), fields(po_id = %order_id, lines = lines.len()), err)]
    pub async fn reconcile(
        &self,
        order_id: &PurchaseOrderId,
        lines: &[ReceivedLine],
    ) -> Result<ReconcileReport, ReconcileError> {
        let order = match self.orders.get(order_id).await {
            Ok(order) => order,
            Err(StoreError::NotFound(_)) => {
                return Err(ReconcileError::OrderNotFound(order_id.clone()));
            }
            Err(err) => return Err(err.into()),
        };
        Ok(self.apply(&order, lines).await)
    }

    /// Apply `lines` against an already loaded order.
    pub async fn apply(&self, order: &PurchaseOrder, lines: &[ReceivedLine]) -> ReconcileReport {
        let plan = plan_stock_adjustments(order, lines);
        let mut report = ReconcileReport::default();

        for entry in &plan {
            match entry {
                LinePlan::Adjust(adj) => {
                    match self.materials.adjust_stock(&adj.material_id, adj.delta).await {
                        Ok(resulting_stock) => {
                            if resulting_stock < 0 {
                                tracing::warn!(
                                    po_id = %order.id,
                                    material_id = %adj.material_id,
                                    resulting_stock,
                                    "stock went negative"
                                );
                            }
                            tracing::info!(
                                po_id = %order.id,
                                line = adj.line_index,
                                material_id = %adj.material_id,
                                delta = adj.delta,
                                matched_by = ?adj.matched_by,
                                resulting_stock,
                                "stock adjusted"
                            );
                            report.applied.push(AppliedAdjustment {
                                line_index: adj.line_index,
                                material_id: adj.material_id.clone(),
                                delta: adj.delta,
                                matched_by: adj.matched_by,
                                resulting_stock,
                            });
                        }
                        Err(err) => {
                            tracing::warn!(
                                po_id = %order.id,
                                line = adj.line_index,
                                material_id = %adj.material_id,
                                delta = adj.delta,
                                error = %err,
                                "stock adjustment failed, skipping line"
                            );
                            report.failed.push(FailedAdjustment {
                                line_index: adj.line_index,
                                material_id: adj.material_id.clone(),
                                delta: adj.delta,
                                reason: err.to_string(),
                            });
                        }
                    }
                }
                LinePlan::Unmatched { line_index } => {
                    let key = ReceivedLineKey::from(&lines[*line_index]);
                    tracing::warn!(
                        po_id = %order.id,
                        line = *line_index,
                        material_id = ?key.material_id,
                        material_name = ?key.material_name,
                        material_code = ?key.material_code,
                        "received line matches no order line, skipping"
                    );
                    report.unmatched.push(UnmatchedLine {
                        line_index: *line_index,
                        line: key,
                    });
                }
            }
        }

        // Over-receipt is accepted; it is only surfaced in the logs.
        let totals = net_deltas(&plan);
        for (material_id, received) in &totals {
            let ordered = order.ordered_qty(material_id);
            if *received > ordered {
                tracing::warn!(
                    po_id = %order.id,
                    material_id = %material_id,
                    received,
                    ordered,
                    "received more than ordered"
                );
            }
        }

        tracing::info!(
            po_id = %order.id,
            applied = report.applied.len(),
            unmatched = report.unmatched.len(),
            failed = report.failed.len(),
            materials = totals.len(),
            "receipt reconciled"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use sqlx::SqlitePool;

    use super::*;
    use crate::error::StoreResult;
    use crate::store::test_support::{seed_supplier, test_pool};
    use crate::store::{SqliteMaterialStore, SqlitePurchaseOrderStore};
    use shopfloor_inventory::{Material, MaterialCategory};
    use shopfloor_purchasing::{OrderLine, PurchaseOrderStatus};

    fn test_material(id: &str, code: &str, name: &str, stock: i64) -> Material {
        Material {
            id: id.parse().unwrap(),
            code: code.to_string(),
            name: name.to_string(),
            unit: "Pcs".to_string(),
            current_stock: stock,
            safety_stock: 0,
            price_per_unit: 1.0,
            category: MaterialCategory::Raw,
        }
    }

    fn line_for(m: &Material, qty: i64) -> OrderLine {
        OrderLine {
            material_id: m.id.clone(),
            material_name: Some(m.name.clone()),
            material_code: Some(m.code.clone()),
            qty,
            unit_price: 10.0,
            total_price: qty as f64 * 10.0,
        }
    }

    fn test_order(items: Vec<OrderLine>) -> PurchaseOrder {
        PurchaseOrder {
            id: "po1".parse().unwrap(),
            code: "PO-001".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            supplier_id: "sup1".parse().unwrap(),
            description: None,
            items,
            status: PurchaseOrderStatus::Open,
            grand_total: 0.0,
        }
    }

    async fn setup(
        materials: &[Material],
        order: &PurchaseOrder,
    ) -> (
        SqlitePool,
        StockReconciler<SqlitePurchaseOrderStore, SqliteMaterialStore>,
    ) {
        let pool = test_pool().await;
        seed_supplier(&pool, "sup1").await;
        let material_store = SqliteMaterialStore::new(pool.clone());
        for m in materials {
            material_store.insert(m).await.unwrap();
        }
        let order_store = SqlitePurchaseOrderStore::new(pool.clone());
        order_store.insert(order).await.unwrap();
        (pool.clone(), StockReconciler::new(order_store, material_store))
    }

    async fn stock_of(pool: &SqlitePool, id: &str) -> i64 {
        SqliteMaterialStore::new(pool.clone())
            .get(&id.parse().unwrap())
            .await
            .unwrap()
            .current_stock
    }

    #[tokio::test]
    async fn exact_id_match_adds_received_qty() {
        let m1 = test_material("m1", "STL-01", "Steel Plate", 100);
        let order = test_order(vec![line_for(&m1, 50)]);
        let (pool, reconciler) = setup(&[m1], &order).await;

        let report = reconciler
            .reconcile(
                &order.id,
                &[ReceivedLine {
                    material_id: Some("m1".parse().unwrap()),
                    received_qty: Some(30),
                    ..Default::default()
                }],
            )
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.applied[0].resulting_stock, 130);
        assert_eq!(stock_of(&pool, "m1").await, 130);
    }

    #[tokio::test]
    async fn code_fallback_uses_qty_when_received_qty_absent() {
        let m2 = test_material("m2", "BLT-08", "Bolt", 0);
        let order = test_order(vec![line_for(&m2, 100)]);
        let (pool, reconciler) = setup(&[m2], &order).await;

        let report = reconciler
            .reconcile(
                &order.id,
                &[ReceivedLine {
                    material_code: Some("BLT-08".to_string()),
                    qty: Some(10),
                    ..Default::default()
                }],
            )
            .await
            .unwrap();

        assert_eq!(report.applied[0].matched_by, MatchedBy::MaterialCode);
        assert_eq!(stock_of(&pool, "m2").await, 10);
    }

    #[tokio::test]
    async fn unmatched_line_is_skipped_and_others_apply() {
        let m1 = test_material("m1", "STL-01", "Steel Plate", 100);
        let m9 = test_material("m9", "ODD-99", "Odd", 7);
        let order = test_order(vec![line_for(&m1, 50)]);
        let (pool, reconciler) = setup(&[m1, m9], &order).await;

        let report = reconciler
            .reconcile(
                &order.id,
                &[
                    ReceivedLine {
                        material_id: Some("m9".parse().unwrap()),
                        received_qty: Some(5),
                        ..Default::default()
                    },
                    ReceivedLine {
                        material_id: Some("m1".parse().unwrap()),
                        received_qty: Some(1),
                        ..Default::default()
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(report.unmatched.len(), 1);
        assert_eq!(report.unmatched[0].line_index, 0);
        assert_eq!(report.applied.len(), 1);
        assert_eq!(stock_of(&pool, "m9").await, 7);
        assert_eq!(stock_of(&pool, "m1").await, 101);
    }

    #[tokio::test]
    async fn missing_order_touches_nothing() {
        let m1 = test_material("m1", "STL-01", "Steel Plate", 100);
        let order = test_order(vec![line_for(&m1, 50)]);
        let (pool, reconciler) = setup(&[m1], &order).await;

        let err = reconciler
            .reconcile(
                &"po404".parse().unwrap(),
                &[ReceivedLine {
                    material_id: Some("m1".parse().unwrap()),
                    received_qty: Some(30),
                    ..Default::default()
                }],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::OrderNotFound(id) if id.as_str() == "po404"));
        assert_eq!(stock_of(&pool, "m1").await, 100);
    }

    #[tokio::test]
    async fn repeated_lines_for_one_material_accumulate() {
        let m1 = test_material("m1", "STL-01", "Steel Plate", 0);
        let order = test_order(vec![line_for(&m1, 50)]);
        let (pool, reconciler) = setup(&[m1], &order).await;

        let lines: Vec<_> = [5, 7, 11]
            .into_iter()
            .map(|q| ReceivedLine {
                material_name: Some("Steel Plate".to_string()),
                received_qty: Some(q),
                ..Default::default()
            })
            .collect();
        reconciler.reconcile(&order.id, &lines).await.unwrap();

        assert_eq!(stock_of(&pool, "m1").await, 23);
    }

    /// Material store that fails writes for selected materials.
    struct FlakyMaterials {
        failing: Vec<MaterialId>,
        stock: Mutex<BTreeMap<MaterialId, i64>>,
    }

    #[async_trait]
    impl MaterialStore for FlakyMaterials {
        async fn list(&self) -> StoreResult<Vec<Material>> {
            Ok(vec![])
        }

        async fn get(&self, _id: &MaterialId) -> StoreResult<Material> {
            Err(StoreError::NotFound("material"))
        }

        async fn insert(&self, _material: &Material) -> StoreResult<()> {
            Ok(())
        }

        async fn update(&self, _material: &Material) -> StoreResult<()> {
            Ok(())
        }

        async fn delete(&self, _id: &MaterialId) -> StoreResult<()> {
            Ok(())
        }

        async fn adjust_stock(&self, id: &MaterialId, delta: i64) -> StoreResult<i64> {
            if self.failing.contains(id) {
                return Err(StoreError::Database("disk I/O error".to_string()));
            }
            let mut stock = self.stock.lock().unwrap();
            let entry = stock.entry(id.clone()).or_insert(0);
            *entry += delta;
            Ok(*entry)
        }
    }

    #[tokio::test]
    async fn failed_write_is_reported_and_processing_continues() {
        let m1 = test_material("m1", "STL-01", "Steel Plate", 0);
        let m2 = test_material("m2", "BLT-08", "Bolt", 0);
        let order = test_order(vec![line_for(&m1, 1), line_for(&m2, 1)]);
        let flaky = FlakyMaterials {
            failing: vec![m1.id.clone()],
            stock: Mutex::new(BTreeMap::new()),
        };
        let reconciler = StockReconciler::new(
            SqlitePurchaseOrderStore::new(test_pool().await),
            flaky,
        );

        let report = reconciler
            .apply(
                &order,
                &[
                    ReceivedLine {
                        material_id: Some(m1.id.clone()),
                        received_qty: Some(4),
                        ..Default::default()
                    },
                    ReceivedLine {
                        material_id: Some(m2.id.clone()),
                        received_qty: Some(6),
                        ..Default::default()
                    },
                ],
            )
            .await;

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].material_id, m1.id);
        assert!(report.failed[0].reason.contains("disk I/O error"));
        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.applied[0].resulting_stock, 6);
    }

    #[tokio::test]
    async fn deleted_material_fails_its_line_only() {
        let m1 = test_material("m1", "STL-01", "Steel Plate", 0);
        let ghost = test_material("ghost", "GHS-00", "Ghost", 0);
        let order = test_order(vec![line_for(&m1, 1), line_for(&ghost, 1)]);
        let (pool, reconciler) = setup(&[m1], &order).await;

        let report = reconciler
            .reconcile(
                &order.id,
                &[
                    ReceivedLine {
                        material_code: Some("GHS-00".to_string()),
                        qty: Some(3),
                        ..Default::default()
                    },
                    ReceivedLine {
                        material_code: Some("STL-01".to_string()),
                        qty: Some(3),
                        ..Default::default()
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].reason.contains("not found"));
        assert_eq!(stock_of(&pool, "m1").await, 3);
    }

    #[tokio::test]
    async fn overflowing_quantities_fail_the_line_without_panicking() {
        let m1 = test_material("m1", "STL-01", "Steel Plate", 100);
        let order = test_order(vec![line_for(&m1, 1)]);
        let (pool, reconciler) = setup(&[m1], &order).await;
        let huge = i64::MAX / 2 + 1;
        let line = ReceivedLine {
            material_id: Some("m1".parse().unwrap()),
            received_qty: Some(huge),
            ..Default::default()
        };

        let report = reconciler
            .reconcile(&order.id, &[line.clone(), line])
            .await
            .unwrap();

        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].reason.contains("overflows"));
        assert_eq!(stock_of(&pool, "m1").await, 100 + huge);
    }
}
