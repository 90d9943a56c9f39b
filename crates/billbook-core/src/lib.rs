//! # billbook-core: Pure Billing Logic for Billbook POS
//!
//! Everything that decides *what* a bill is lives here, with zero I/O.
//! Persistence and orchestration sit in `billbook-db` and `billbook-engine`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Billbook POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  apps/register (terminal front end)             │   │
//! │  │     scan ──► qty ──► totals ──► checkout ──► return             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │   billbook-engine: Checkout saga, Stock Reconciler, Returns     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ billbook-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  types   │ │  money   │ │   cart   │ │ pricing  │          │   │
//! │  │   │ Product  │ │  Money   │ │   Cart   │ │  Totals  │          │   │
//! │  │   │  Bill    │ │ TaxCalc  │ │ LineItem │ │          │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │ catalog  │ │ returns  │ │ bill_id  │ │validation│          │   │
//! │  │   │ Snapshot │ │ R-bills  │ │  BILL-…  │ │  rules   │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  billbook-db (Database Layer)                   │   │
//! │  │             SQLite queries, migrations, repositories            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Bill, LineItem, StockAdjustment)
//! - [`money`] - Money type with integer arithmetic
//! - [`catalog`] - Code-keyed catalog snapshot
//! - [`cart`] - Cart aggregation with stock checks
//! - [`pricing`] - Subtotal / tax / total
//! - [`returns`] - Return bill construction
//! - [`bill_id`] - Sortable bill number generation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use billbook_core::money::Money;
//! use billbook_core::types::TaxRate;
//!
//! let subtotal = Money::from_minor(2500); // 25.00
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(1800));
//! assert_eq!(tax.minor(), 450);          // 4.50
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bill_id;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod money;
pub mod pricing;
pub mod returns;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use bill_id::BillIdGenerator;
pub use cart::Cart;
pub use catalog::CatalogSnapshot;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{compute_return_totals, compute_totals};
pub use returns::{build_return, ReturnSelection};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Default tax rate: 18% GST.
pub const DEFAULT_TAX_RATE_BPS: u32 = 1800;
