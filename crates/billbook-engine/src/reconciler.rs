//! # Stock Reconciler
//!
//! Applies signed stock deltas one product at a time.
//!
//! ## Per-Adjustment Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  BLIND                              OPTIMISTIC (default)                │
//! │  ─────                              ──────────                          │
//! │  p = get(code)                      loop attempt in 1..=max_attempts:   │
//! │  new = max(0, p.qty + delta)          p = get(code)                     │
//! │  set_quantity(p.id, new)              new = max(0, p.qty + delta)       │
//! │                                       if cas(p.id, new, p.version):     │
//! │  Two tills reading the same             done                            │
//! │  quantity both write back;            else: someone wrote first,        │
//! │  the last write wins.                   re-read and retry               │
//! │                                     exhausted → Conflict                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Adjustments are independent: a failure is recorded and the next one is
//! still attempted. Nothing already written is undone.

use billbook_core::{ProductCode, StockAdjustment};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::ConfigError;
use crate::store::CatalogStore;

// =============================================================================
// Concurrency Mode
// =============================================================================

/// How a stock write guards against another till's concurrent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrencyMode {
    /// Read, compute, overwrite. Concurrent sales of one product can lose
    /// a decrement.
    Blind,

    /// Compare-and-set on the product version, retried on conflict.
    #[default]
    Optimistic,
}

impl fmt::Display for ConcurrencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcurrencyMode::Blind => write!(f, "blind"),
            ConcurrencyMode::Optimistic => write!(f, "optimistic"),
        }
    }
}

impl FromStr for ConcurrencyMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blind" | "last-writer-wins" => Ok(ConcurrencyMode::Blind),
            "optimistic" | "cas" => Ok(ConcurrencyMode::Optimistic),
            other => Err(ConfigError::Invalid(format!(
                "Unknown stock write mode: '{}'. Valid options: blind, optimistic",
                other
            ))),
        }
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// A stock write that landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedAdjustment {
    pub product_code: ProductCode,
    pub delta: i64,
    pub previous: i64,
    pub new: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StockFailureReason {
    /// The product no longer exists in the catalog.
    NotFound,
    /// Every compare-and-set attempt lost to another writer.
    Conflict { attempts: u32 },
    /// The store rejected the read or the write.
    Store(String),
}

impl fmt::Display for StockFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockFailureReason::NotFound => write!(f, "product not found"),
            StockFailureReason::Conflict { attempts } => {
                write!(f, "concurrent update conflict after {} attempts", attempts)
            }
            StockFailureReason::Store(msg) => write!(f, "{}", msg),
        }
    }
}

/// A stock write that did not land. `adjustment` is safe to re-apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockFailure {
    pub adjustment: StockAdjustment,
    pub reason: StockFailureReason,
}

/// Every adjustment landed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub applied: Vec<AppliedAdjustment>,
}

/// At least one adjustment did not land. `applied` were written and stay
/// written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} stock adjustment(s) failed, {} applied", .failed.len(), .applied.len())]
pub struct ReconcileError {
    pub applied: Vec<AppliedAdjustment>,
    pub failed: Vec<StockFailure>,
}

impl ReconcileError {
    /// The adjustments that still need applying.
    pub fn pending(&self) -> Vec<StockAdjustment> {
        self.failed.iter().map(|f| f.adjustment.clone()).collect()
    }
}

// =============================================================================
// Reconciler
// =============================================================================

#[derive(Clone)]
pub struct StockReconciler {
    store: Arc<dyn CatalogStore>,
    mode: ConcurrencyMode,
    max_attempts: u32,
}

impl StockReconciler {
    /// `max_attempts` bounds optimistic retries; a value of 0 is treated
    /// as 1.
    pub fn new(store: Arc<dyn CatalogStore>, mode: ConcurrencyMode, max_attempts: u32) -> Self {
        StockReconciler {
            store,
            mode,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn mode(&self) -> ConcurrencyMode {
        self.mode
    }

    /// Applies `adjustments` in order.
    pub async fn apply(
        &self,
        adjustments: &[StockAdjustment],
    ) -> Result<ReconcileReport, ReconcileError> {
        let mut applied = Vec::with_capacity(adjustments.len());
        let mut failed = Vec::new();

        for adjustment in adjustments {
            match self.apply_one(adjustment).await {
                Ok(done) => applied.push(done),
                Err(reason) => {
                    error!(
                        product_code = %adjustment.product_code,
                        delta = adjustment.delta,
                        reason = %reason,
                        "Stock adjustment failed"
                    );
                    failed.push(StockFailure {
                        adjustment: adjustment.clone(),
                        reason,
                    });
                }
            }
        }

        info!(
            mode = %self.mode,
            applied = applied.len(),
            failed = failed.len(),
            "Stock reconciliation finished"
        );

        if failed.is_empty() {
            Ok(ReconcileReport { applied })
        } else {
            Err(ReconcileError { applied, failed })
        }
    }

    /// Applies a single adjustment under the configured mode.
    pub async fn apply_one(
        &self,
        adjustment: &StockAdjustment,
    ) -> Result<AppliedAdjustment, StockFailureReason> {
        match self.mode {
            ConcurrencyMode::Blind => self.apply_blind(adjustment).await,
            ConcurrencyMode::Optimistic => self.apply_optimistic(adjustment).await,
        }
    }

    async fn apply_blind(
        &self,
        adjustment: &StockAdjustment,
    ) -> Result<AppliedAdjustment, StockFailureReason> {
        let product = self
            .store
            .get(adjustment.product_code.as_str())
            .await
            .map_err(|e| StockFailureReason::Store(e.to_string()))?
            .ok_or(StockFailureReason::NotFound)?;

        let new = adjustment.apply_to(product.quantity);
        self.store
            .set_quantity(&product.product_id, new)
            .await
            .map_err(|e| StockFailureReason::Store(e.to_string()))?;

        debug!(
            product_code = %adjustment.product_code,
            previous = product.quantity,
            new,
            "Stock written"
        );

        Ok(AppliedAdjustment {
            product_code: adjustment.product_code.clone(),
            delta: adjustment.delta,
            previous: product.quantity,
            new,
        })
    }

    async fn apply_optimistic(
        &self,
        adjustment: &StockAdjustment,
    ) -> Result<AppliedAdjustment, StockFailureReason> {
        for attempt in 1..=self.max_attempts {
            let product = self
                .store
                .get(adjustment.product_code.as_str())
                .await
                .map_err(|e| StockFailureReason::Store(e.to_string()))?
                .ok_or(StockFailureReason::NotFound)?;

            let new = adjustment.apply_to(product.quantity);
            let written = self
                .store
                .compare_and_set_quantity(&product.product_id, new, product.version)
                .await
                .map_err(|e| StockFailureReason::Store(e.to_string()))?;

            if written {
                debug!(
                    product_code = %adjustment.product_code,
                    previous = product.quantity,
                    new,
                    attempt,
                    "Stock written"
                );
                return Ok(AppliedAdjustment {
                    product_code: adjustment.product_code.clone(),
                    delta: adjustment.delta,
                    previous: product.quantity,
                    new,
                });
            }

            debug!(
                product_code = %adjustment.product_code,
                attempt,
                "Stock version moved, retrying"
            );
        }

        Err(StockFailureReason::Conflict {
            attempts: self.max_attempts,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
