//! # Checkout
//!
//! Turns a cart into a committed bill and moves stock.
//!
//! ## Checkout Saga
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. Validate        refresh snapshot, re-check every line               │
//! │        │            ✗ EmptyCart / InsufficientStock   (nothing written) │
//! │        ▼                                                                │
//! │  2. Build bill      bill id + pricing from the cart                     │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  3. PersistBill     ledger.create(bill)                                 │
//! │        │            ✗ Persistence                     (nothing written) │
//! │        ▼                                                                │
//! │  ═══════════════════ COMMITTED ════════════════════════════════════════ │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  4. AdjustStock     one delta per line, independently                   │
//! │        │            ✗ PartialCommit { applied, failed, pending }        │
//! │        ▼                                                                │
//! │  5. RefreshCatalog  failure is logged, not returned                     │
//! │  6. ClearCart                                                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Once step 3 succeeds the sale stands. A partial commit is never retried
//! as a whole: that would write a second bill and decrement stock twice.
//! [`Checkout::resume_stock`] re-applies only the adjustments in `pending`.

use billbook_core::validation::{validate_customer_name, validate_customer_phone};
use billbook_core::{
    Bill, BillIdGenerator, Cart, CoreResult, PaymentMethod, PersistedBill, StockAdjustment,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::{EngineError, EngineResult};
use crate::ledger::BillLedger;
use crate::reconciler::{
    AppliedAdjustment, ReconcileError, ReconcileReport, StockFailure, StockReconciler,
};
use crate::saga::{SagaLog, SagaStep};

// =============================================================================
// Request / Receipt
// =============================================================================

/// Customer and payment details entered at the till.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// May be empty for a walk-in sale.
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub payment_method: PaymentMethod,
}

impl CheckoutRequest {
    /// An anonymous sale.
    pub fn walk_in(payment_method: PaymentMethod) -> Self {
        CheckoutRequest {
            customer_name: String::new(),
            customer_phone: None,
            payment_method,
        }
    }

    /// Trimmed and validated copy. A blank phone becomes `None`.
    pub fn normalized(&self) -> CoreResult<Self> {
        let customer_name = self.customer_name.trim().to_string();
        validate_customer_name(&customer_name)?;

        let customer_phone = match self.customer_phone.as_deref().map(str::trim) {
            Some(phone) if !phone.is_empty() => {
                validate_customer_phone(phone)?;
                Some(phone.to_string())
            }
            _ => None,
        };

        Ok(CheckoutRequest {
            customer_name,
            customer_phone,
            payment_method: self.payment_method,
        })
    }
}

/// A fully committed checkout.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub bill: PersistedBill,
    pub stock: Vec<AppliedAdjustment>,
    pub log: SagaLog,
}

/// A committed bill whose stock was only partly adjusted.
#[derive(Debug, Clone)]
pub struct PartialCommit {
    pub bill: PersistedBill,
    pub applied: Vec<AppliedAdjustment>,
    pub failed: Vec<StockFailure>,
    /// The adjustments from `failed`, ready for [`Checkout::resume_stock`].
    pub pending: Vec<StockAdjustment>,
    pub log: SagaLog,
}

// =============================================================================
// Checkout
// =============================================================================

#[derive(Clone)]
pub struct Checkout {
    ledger: BillLedger,
    reconciler: StockReconciler,
    ids: Arc<BillIdGenerator>,
}

impl Checkout {
    pub fn new(ledger: BillLedger, reconciler: StockReconciler, ids: Arc<BillIdGenerator>) -> Self {
        Checkout {
            ledger,
            reconciler,
            ids,
        }
    }

    /// Runs the checkout saga for `cart`.
    ///
    /// On success, and on `PartialCommit`, the cart is cleared and the
    /// catalog refreshed. On any other error both are left as they were.
    pub async fn run(
        &self,
        cart: &mut Cart,
        catalog: &mut Catalog,
        request: &CheckoutRequest,
    ) -> EngineResult<CheckoutReceipt> {
        let mut log = SagaLog::new();

        if cart.is_empty() {
            return Err(EngineError::EmptyCart);
        }
        let request = request.normalized()?;

        // 1. Re-validate against what the catalog says now
        let snapshot = catalog.refresh().await?;
        let short: Vec<String> = cart
            .shortfalls(snapshot)
            .into_iter()
            .map(|line| line.product_name.clone())
            .collect();
        if !short.is_empty() {
            warn!(products = ?short, "Checkout blocked by insufficient stock");
            return Err(EngineError::InsufficientStock {
                product_names: short,
            });
        }
        log.done(SagaStep::Validate);

        // 2. Build
        let now = Utc::now();
        let bill = sale_bill(cart, &request, self.ids.next(now), now);
        debug!(
            bill_id = %bill.bill_id,
            lines = bill.items.len(),
            total = %bill.total,
            "Bill built"
        );

        // 3. Persist
        let persisted = match self.ledger.create(&bill).await {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!(bill_id = %bill.bill_id, error = %e, "Bill not saved; nothing committed");
                return Err(EngineError::Persistence(e));
            }
        };
        log.done(SagaStep::PersistBill);

        // 4. Stock
        let adjustments = cart.sale_adjustments();
        let outcome = self.reconciler.apply(&adjustments).await;
        record_stock_steps(&mut log, &adjustments, outcome.as_ref().err());

        // 5. Refresh and clear
        match catalog.refresh().await {
            Ok(_) => log.done(SagaStep::RefreshCatalog),
            Err(e) => {
                warn!(error = %e, "Catalog refresh after checkout failed; snapshot is stale");
                log.failed(SagaStep::RefreshCatalog, e);
            }
        }
        cart.clear();
        log.done(SagaStep::ClearCart);

        match outcome {
            Ok(report) => {
                info!(
                    bill_id = %persisted.bill.bill_id,
                    total = %persisted.bill.total,
                    "Checkout complete"
                );
                Ok(CheckoutReceipt {
                    bill: persisted,
                    stock: report.applied,
                    log,
                })
            }
            Err(err) => {
                warn!(
                    bill_id = %persisted.bill.bill_id,
                    failed = err.failed.len(),
                    "Bill committed with partial stock update"
                );
                let pending = err.pending();
                Err(EngineError::PartialCommit(Box::new(PartialCommit {
                    bill: persisted,
                    applied: err.applied,
                    failed: err.failed,
                    pending,
                    log,
                })))
            }
        }
    }

    /// Re-applies adjustments that never landed after a partial commit.
    ///
    /// Only pass `PartialCommit::pending`; adjustments that were applied
    /// must not be passed again.
    pub async fn resume_stock(
        &self,
        catalog: &mut Catalog,
        pending: &[StockAdjustment],
    ) -> Result<ReconcileReport, ReconcileError> {
        info!(adjustments = pending.len(), "Resuming stock adjustments");
        let outcome = self.reconciler.apply(pending).await;

        if let Err(e) = catalog.refresh().await {
            warn!(error = %e, "Catalog refresh after stock resume failed");
        }
        outcome
    }
}

fn sale_bill(cart: &Cart, request: &CheckoutRequest, bill_id: String, date: DateTime<Utc>) -> Bill {
    let totals = cart.totals();
    Bill {
        bill_id,
        date,
        items: cart.to_bill_items(),
        subtotal: totals.subtotal,
        tax: totals.tax,
        total: totals.total,
        tax_rate: cart.tax_rate(),
        customer_name: request.customer_name.clone(),
        customer_phone: request.customer_phone.clone(),
        payment_method: request.payment_method,
        is_return: false,
        original_bill_id: None,
    }
}

/// One `AdjustStock` entry per adjustment, in the order they were applied.
pub(crate) fn record_stock_steps(
    log: &mut SagaLog,
    adjustments: &[StockAdjustment],
    failure: Option<&ReconcileError>,
) {
    for adjustment in adjustments {
        let step = SagaStep::AdjustStock {
            product_code: adjustment.product_code.to_string(),
        };
        let failed = failure.and_then(|err| {
            err.failed
                .iter()
                .find(|f| f.adjustment.product_code == adjustment.product_code)
        });
        match failed {
            Some(f) => log.failed(step, &f.reason),
            None => log.done(step),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
