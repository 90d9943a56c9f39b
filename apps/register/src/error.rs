//! # Cashier-Facing Errors
//!
//! Every failure is turned into a short message plus a code the till uses
//! to decide whether the cashier can simply try again.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ParseError ───────────────────────────────┐                            │
//! │                                            ▼                            │
//! │  EngineError ── Core(..)          ──► RegisterError { code, message }  │
//! │              ── InsufficientStock ──►      │                            │
//! │              ── Persistence       ──►      ▼                            │
//! │              ── PartialCommit     ──►  printed as "[CODE] message"     │
//! │              ── Return*           ──►                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billbook_core::CoreError;
use billbook_engine::{EngineError, StoreError};
use std::fmt;

use crate::commands::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Bad command syntax.
    Input,

    /// Product or bill not found.
    NotFound,

    /// Cart rule violated (stock ceiling, empty cart, bad return quantity).
    CartError,

    /// Storage failed before anything was written. Safe to repeat.
    Retry,

    /// Something was written and needs a manager's attention.
    Reconcile,

    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Input => "INPUT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::CartError => "CART",
            ErrorCode::Retry => "RETRY",
            ErrorCode::Reconcile => "RECONCILE",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterError {
    pub code: ErrorCode,
    pub message: String,
}

impl RegisterError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        RegisterError {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for RegisterError {}

impl From<ParseError> for RegisterError {
    fn from(err: ParseError) -> Self {
        RegisterError::new(ErrorCode::Input, err.to_string())
    }
}

impl From<CoreError> for RegisterError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(code) => {
                RegisterError::new(ErrorCode::NotFound, format!("Product not found: {}", code))
            }
            CoreError::Scan(_) | CoreError::InvalidCode | CoreError::Validation(_) => {
                RegisterError::new(ErrorCode::Input, err.to_string())
            }
            other => RegisterError::new(ErrorCode::CartError, other.to_string()),
        }
    }
}

impl From<EngineError> for RegisterError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Core(core) => RegisterError::from(core),
            EngineError::BillNotFound(id) => {
                RegisterError::new(ErrorCode::NotFound, format!("Bill not found: {}", id))
            }
            EngineError::EmptyCart | EngineError::InsufficientStock { .. } => {
                RegisterError::new(ErrorCode::CartError, err.to_string())
            }
            EngineError::Persistence(StoreError::Database(ref db)) => {
                // Log the actual error but show a generic message
                tracing::error!(error = %db, "Database operation failed");
                RegisterError::new(
                    ErrorCode::Retry,
                    "Could not save. Nothing was recorded; please try again.",
                )
            }
            EngineError::Persistence(StoreError::Unavailable(ref reason)) => {
                tracing::error!(%reason, "Store unavailable");
                RegisterError::new(
                    ErrorCode::Retry,
                    "Store unavailable. Nothing was recorded; please try again.",
                )
            }
            e if e.needs_reconciliation() => {
                tracing::error!(error = %e, "Committed with failures");
                RegisterError::new(ErrorCode::Reconcile, e.to_string())
            }
            other => RegisterError::new(ErrorCode::Internal, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billbook_db::DbError;

    #[test]
    fn test_cart_and_lookup_errors() {
        let err = RegisterError::from(EngineError::Core(CoreError::ProductNotFound(
            "8901".to_string(),
        )));
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.to_string(), "[NOT_FOUND] Product not found: 8901");

        let err = RegisterError::from(EngineError::InsufficientStock {
            product_names: vec!["Atta".to_string(), "Besan".to_string()],
        });
        assert_eq!(err.code, ErrorCode::CartError);
        assert!(err.message.contains("Atta, Besan"));

        let err = RegisterError::from(EngineError::Core(CoreError::InvalidCode));
        assert_eq!(err.code, ErrorCode::Input);
    }

    #[test]
    fn test_storage_failure_is_retryable_and_hides_detail() {
        let err = RegisterError::from(EngineError::Persistence(StoreError::Database(
            DbError::QueryFailed("disk I/O error".to_string()),
        )));
        assert_eq!(err.code, ErrorCode::Retry);
        assert!(!err.message.contains("disk"));
    }

    #[test]
    fn test_committed_failures_need_reconciling() {
        let err = RegisterError::from(EngineError::ReturnAborted {
            applied: Vec::new(),
            failed: Vec::new(),
        });
        assert_eq!(err.code, ErrorCode::Reconcile);
    }
}
