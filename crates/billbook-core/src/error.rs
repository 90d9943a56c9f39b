//! # Billing Errors
//!
//! What can go wrong before anything touches storage.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ValidationError   bad field (code, name, phone, quantity, price)       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  CoreError         cart, stock and return rules                         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  EngineError       (billbook-engine) adds storage failures, aborted     │
//! │                    returns and PartialCommit                            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  RegisterError     (register app) what the cashier reads                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant here is recoverable inside the session: the cart is left
//! unchanged and the cashier sees the message.

use thiserror::Error;

use crate::types::ScanError;

/// A cart, stock or return rule was broken.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No product in the catalog (or line in the cart / item on a bill)
    /// matches the given code.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The product has no stock and is not in the cart yet.
    #[error("{product_name} is out of stock")]
    OutOfStock {
        product_code: String,
        product_name: String,
    },

    /// Adding or raising a line would exceed the product's stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Scan "8901234" (already x3 in cart)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { available: 3, requested: 4 }
    ///      │
    ///      ▼
    /// UI shows: "Cannot add more. Only 3 available in stock."
    /// ```
    #[error("Cannot add more {product_name}. Only {available} available in stock (requested {requested})")]
    InsufficientStock {
        product_code: String,
        product_name: String,
        available: i64,
        requested: i64,
    },

    /// The operation is not allowed for this record (e.g. returning a return bill).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A return was submitted with every quantity at zero.
    #[error("Please select items to return")]
    NoItemsSelected,

    /// Requested return quantity is outside `[0, remaining sold quantity]`.
    #[error("Return quantity {requested} for {product_code} is out of range (max {max})")]
    ReturnQuantityOutOfRange {
        product_code: String,
        requested: i64,
        max: i64,
    },

    /// The scanner produced an empty code.
    #[error("Invalid barcode")]
    InvalidCode,

    /// The barcode capability failed before producing a code.
    #[error("Scanner error: {0}")]
    Scan(#[from] ScanError),

    /// No room for another distinct product.
    #[error("Cart cannot hold more than {max} different products")]
    CartTooLarge { max: usize },

    #[error("{0}")]
    Validation(#[from] ValidationError),
}

/// A single field failed its check. `field` is the name the cashier sees.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} is longer than {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },

    /// Bad characters in a code, phone or id.
    #[error("{field} is not valid: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Payment method or category outside the fixed list.
    #[error("{field} must be one of {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

pub type CoreResult<T> = Result<T, CoreError>;
