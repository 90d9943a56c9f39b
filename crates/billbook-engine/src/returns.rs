//! # Return Processor
//!
//! Reverses part or all of a sale with a new, negated bill.
//!
//! ## Return Saga
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. Validate     load original + earlier returns, build_return()        │
//! │        │         ✗ BillNotFound / InvalidOperation / out of range       │
//! │        ▼                                                                │
//! │  2. AdjustStock  +quantity per returned product                         │
//! │        │         ✗ ReturnAborted { applied, failed }   (no bill)        │
//! │        ▼                                                                │
//! │  3. PersistBill  ledger.create(return bill)                             │
//! │        │         ✗ ReturnStockRestoredBillNotSaved                      │
//! │        ▼                                                                │
//! │  4. RefreshCatalog                                                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock goes back before the financial record is written: a failed restore
//! must stop the refund from being recorded. The original bill is never
//! touched.

use billbook_core::{build_return, PersistedBill, ReturnSelection, StockAdjustment};
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::catalog::Catalog;
use crate::checkout::record_stock_steps;
use crate::error::{EngineError, EngineResult};
use crate::ledger::BillLedger;
use crate::reconciler::{AppliedAdjustment, StockReconciler};
use crate::saga::{SagaLog, SagaStep};

/// A recorded return.
#[derive(Debug, Clone)]
pub struct ReturnOutcome {
    pub bill: PersistedBill,
    pub stock: Vec<AppliedAdjustment>,
    pub log: SagaLog,
}

#[derive(Clone)]
pub struct ReturnProcessor {
    ledger: BillLedger,
    reconciler: StockReconciler,
}

impl ReturnProcessor {
    pub fn new(ledger: BillLedger, reconciler: StockReconciler) -> Self {
        ReturnProcessor { ledger, reconciler }
    }

    /// Returns the quantities in `selection` from bill `original_bill_id`.
    pub async fn process(
        &self,
        catalog: &mut Catalog,
        original_bill_id: &str,
        selection: &ReturnSelection,
    ) -> EngineResult<ReturnOutcome> {
        let mut log = SagaLog::new();

        // 1. Validate
        let original = self
            .ledger
            .get(original_bill_id)
            .await?
            .ok_or_else(|| EngineError::BillNotFound(original_bill_id.trim().to_string()))?;

        let prior = if original.bill.is_return {
            Vec::new()
        } else {
            self.ledger.returns_for(&original.bill.bill_id).await?
        };

        let bill = build_return(&original.bill, selection, &prior, Utc::now())?;
        log.done(SagaStep::Validate);
        debug!(
            bill_id = %bill.bill_id,
            original = %original.bill.bill_id,
            total = %bill.total,
            "Return bill built"
        );

        // 2. Restore stock
        let adjustments: Vec<StockAdjustment> = bill
            .items
            .iter()
            .map(|item| StockAdjustment::restock(item.product_code.clone(), item.quantity))
            .collect();

        let stock = match self.reconciler.apply(&adjustments).await {
            Ok(report) => {
                record_stock_steps(&mut log, &adjustments, None);
                report.applied
            }
            Err(err) => {
                warn!(
                    bill_id = %bill.bill_id,
                    failed = err.failed.len(),
                    applied = err.applied.len(),
                    "Return aborted; return bill not written"
                );
                return Err(EngineError::ReturnAborted {
                    applied: err.applied,
                    failed: err.failed,
                });
            }
        };

        // 3. Persist
        let persisted = match self.ledger.create(&bill).await {
            Ok(persisted) => persisted,
            Err(reason) => {
                error!(
                    bill_id = %bill.bill_id,
                    error = %reason,
                    "Stock restored but return bill not saved"
                );
                return Err(EngineError::ReturnStockRestoredBillNotSaved {
                    bill: Box::new(bill),
                    reason,
                });
            }
        };
        log.done(SagaStep::PersistBill);

        // 4. Refresh
        match catalog.refresh().await {
            Ok(_) => log.done(SagaStep::RefreshCatalog),
            Err(e) => {
                warn!(error = %e, "Catalog refresh after return failed; snapshot is stale");
                log.failed(SagaStep::RefreshCatalog, e);
            }
        }

        info!(
            bill_id = %persisted.bill.bill_id,
            original = %original.bill.bill_id,
            total = %persisted.bill.total,
            "Return recorded"
        );

        Ok(ReturnOutcome {
            bill: persisted,
            stock,
            log,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
