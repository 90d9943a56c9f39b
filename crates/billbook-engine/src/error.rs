//! # Engine Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                             EngineError                                 │
//! │                                                                         │
//! │  NOTHING WRITTEN (fix and retry)                                        │
//! │  ├── Core(CoreError)          cart / return validation                  │
//! │  ├── EmptyCart                                                          │
//! │  ├── InsufficientStock        re-validation against a fresh snapshot    │
//! │  ├── BillNotFound                                                       │
//! │  ├── Persistence(StoreError)  read or write failed before commit        │
//! │  └── Config(ConfigError)                                                │
//! │                                                                         │
//! │  SOMETHING WRITTEN (do NOT retry the whole operation)                   │
//! │  ├── PartialCommit            bill saved, some stock writes failed      │
//! │  │                            → resume_stock(pending) or manual audit   │
//! │  ├── ReturnAborted            some stock restored, no return bill       │
//! │  └── ReturnStockRestoredBillNotSaved                                    │
//! │                               all stock restored, return bill missing   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billbook_core::{Bill, CoreError};
use thiserror::Error;

use crate::checkout::PartialCommit;
use crate::config::ConfigError;
use crate::reconciler::{AppliedAdjustment, StockFailure};
use crate::store::StoreError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Cart is empty")]
    EmptyCart,

    /// Lines the current catalog can no longer cover.
    #[error("Insufficient stock for: {}", .product_names.join(", "))]
    InsufficientStock { product_names: Vec<String> },

    #[error("Bill not found: {0}")]
    BillNotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// The bill is committed; only some of its stock adjustments landed.
    #[error(
        "Bill {} saved but {} stock update(s) failed; stock needs reconciling",
        .0.bill.bill.bill_id,
        .0.failed.len()
    )]
    PartialCommit(Box<PartialCommit>),

    /// A stock restore failed, so the return bill was not written.
    #[error("Return aborted: {} stock update(s) failed, {} applied", .failed.len(), .applied.len())]
    ReturnAborted {
        applied: Vec<AppliedAdjustment>,
        failed: Vec<StockFailure>,
    },

    /// Stock went back on the shelf but the ledger has no record of it.
    #[error("Stock restored for {} but the return bill was not saved: {reason}", .bill.bill_id)]
    ReturnStockRestoredBillNotSaved { bill: Box<Bill>, reason: StoreError },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// True when nothing was written and the same call may simply be
    /// repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Persistence(_))
    }

    /// True when a bill or stock write already happened and an operator
    /// has to look at it.
    pub fn needs_reconciliation(&self) -> bool {
        matches!(
            self,
            EngineError::PartialCommit(_)
                | EngineError::ReturnAborted { .. }
                | EngineError::ReturnStockRestoredBillNotSaved { .. }
        )
    }
}
