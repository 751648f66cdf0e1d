//! Goods receipt intake: persist the receipt, then reconcile stock.

use tracing::instrument;

use shopfloor_purchasing::GoodsReceipt;

use crate::error::StoreError;
use crate::reconciler::{ReconcileError, ReconcileReport, StockReconciler};
use crate::store::{GoodsReceiptStore, MaterialStore, PurchaseOrderStore};

#[derive(Debug, Clone)]
pub struct ReceivingService<O, R, M> {
    receipts: R,
    reconciler: StockReconciler<O, M>,
}

impl<O, R, M> ReceivingService<O, R, M>
where
    O: PurchaseOrderStore,
    R: GoodsReceiptStore,
    M: MaterialStore,
{
    pub fn new(orders: O, receipts: R, materials: M) -> Self {
        Self {
            receipts,
            reconciler: StockReconciler::new(orders, materials),
        }
    }

    /// Store the receipt and apply its lines to stock.
    ///
    /// The receipt is kept whatever the reconciliation outcome; partial
    /// failures are reported per line in the returned report.
    #[instrument(skip(self, receipt), fields(receipt_id = %receipt.id, po_id = %receipt.po_id), err)]
    pub async fn create_receipt(
        &self,
        receipt: GoodsReceipt,
    ) -> Result<(GoodsReceipt, ReconcileReport), ReconcileError> {
        match self.receipts.insert(&receipt).await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                return Err(ReconcileError::OrderNotFound(receipt.po_id.clone()));
            }
            Err(err) => return Err(err.into()),
        }
        tracing::info!(lines = receipt.items.len(), "receipt recorded");

        let report = self.reconciler.reconcile(&receipt.po_id, &receipt.items).await?;
        Ok((receipt, report))
    }
}
