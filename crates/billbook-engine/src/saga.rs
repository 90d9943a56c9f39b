//! # Saga Log
//!
//! Ordered record of what a checkout or return actually did.
//!
//! ```text
//!  Validate        Done
//!  PersistBill     Done
//!  AdjustStock(A)  Done
//!  AdjustStock(B)  Failed("write to B rejected")
//!  RefreshCatalog  Done
//!  ClearCart       Done
//! ```
//!
//! The log travels with the receipt, or with the error once a bill is
//! committed, so an operator can see which steps landed.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum SagaStep {
    Validate,
    PersistBill,
    AdjustStock { product_code: String },
    RefreshCatalog,
    ClearCart,
}

impl fmt::Display for SagaStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SagaStep::Validate => write!(f, "validate"),
            SagaStep::PersistBill => write!(f, "persist bill"),
            SagaStep::AdjustStock { product_code } => write!(f, "adjust stock {}", product_code),
            SagaStep::RefreshCatalog => write!(f, "refresh catalog"),
            SagaStep::ClearCart => write!(f, "clear cart"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "camelCase")]
pub enum StepOutcome {
    Done,
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaEntry {
    pub step: SagaStep,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaLog {
    entries: Vec<SagaEntry>,
}

impl SagaLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: SagaStep, outcome: StepOutcome) {
        self.entries.push(SagaEntry { step, outcome });
    }

    pub fn done(&mut self, step: SagaStep) {
        self.record(step, StepOutcome::Done);
    }

    pub fn failed(&mut self, step: SagaStep, reason: impl ToString) {
        self.record(step, StepOutcome::Failed(reason.to_string()));
    }

    pub fn skipped(&mut self, step: SagaStep) {
        self.record(step, StepOutcome::Skipped);
    }

    pub fn entries(&self) -> &[SagaEntry] {
        &self.entries
    }

    /// Outcome of the first entry for `step`.
    pub fn outcome_of(&self, step: &SagaStep) -> Option<&StepOutcome> {
        self.entries
            .iter()
            .find(|e| &e.step == step)
            .map(|e| &e.outcome)
    }

    pub fn has_failures(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.outcome, StepOutcome::Failed(_)))
    }
}

impl fmt::Display for SagaLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            match &entry.outcome {
                StepOutcome::Done => writeln!(f, "  ✓ {}", entry.step)?,
                StepOutcome::Skipped => writeln!(f, "  - {}", entry.step)?,
                StepOutcome::Failed(reason) => writeln!(f, "  ✗ {}: {}", entry.step, reason)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_keeps_order_and_flags_failures() {
        let mut log = SagaLog::new();
        log.done(SagaStep::Validate);
        log.done(SagaStep::PersistBill);
        log.failed(
            SagaStep::AdjustStock {
                product_code: "B".to_string(),
            },
            "write rejected",
        );

        assert_eq!(log.entries().len(), 3);
        assert_eq!(log.entries()[0].step, SagaStep::Validate);
        assert!(log.has_failures());
        assert_eq!(
            log.outcome_of(&SagaStep::PersistBill),
            Some(&StepOutcome::Done)
        );
        assert!(log.to_string().contains("✗ adjust stock B: write rejected"));
    }
}
