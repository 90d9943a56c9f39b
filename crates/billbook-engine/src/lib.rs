//! # billbook-engine: Checkout, Stock Reconciliation and Returns
//!
//! Coordinates the pure billing core with two independently stored records,
//! the product catalog and the bill ledger, which share no transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Billbook POS Architecture                         │
//! │                                                                         │
//! │  apps/register ──► Engine::open_session() ──► PosSession                │
//! │                                                   │                     │
//! │  ┌────────────────────────────────────────────────▼────────────────┐   │
//! │  │               ★ billbook-engine (THIS CRATE) ★                  │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌────────────┐  ┌────────────┐   │   │
//! │  │   │ catalog  │  │  ledger  │  │ reconciler │  │  checkout  │   │   │
//! │  │   │ snapshot │  │  bills   │  │ per-product│  │  returns   │   │   │
//! │  │   │ refresh  │  │          │  │   deltas   │  │  (sagas)   │   │   │
//! │  │   └────┬─────┘  └────┬─────┘  └─────┬──────┘  └────────────┘   │   │
//! │  │        │             │              │                          │   │
//! │  │   ┌────▼─────────────▼──────────────▼───────────────────────┐  │   │
//! │  │   │  store: CatalogStore / BillStore (SQLite or in-memory)  │  │   │
//! │  │   └─────────────────────────────────────────────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  billbook-core: Cart, pricing, build_return      billbook-db: SQLite   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`store`] - Storage traits and their SQLite / in-memory implementations
//! - [`catalog`] - Snapshot refresh
//! - [`ledger`] - Bill ledger
//! - [`reconciler`] - Stock reconciler (blind or optimistic writes)
//! - [`checkout`] - Checkout saga
//! - [`returns`] - Return processor
//! - [`saga`] - Step-by-step outcome log
//! - [`session`] - One till's cart and snapshot
//! - [`receipt`] - Printable bill projection
//! - [`config`] - TOML + environment configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! let db = Database::new(DbConfig::new("billbook.db")).await?;
//! let engine = Engine::from_database(&db, EngineConfig::load(None)?);
//!
//! let mut till = engine.open_session().await?;
//! till.scan(Ok("8900000000001"))?;
//! let receipt = till.checkout(&CheckoutRequest::walk_in(PaymentMethod::Cash)).await?;
//! println!("{}", engine.receipt(&receipt.bill).render_text());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod receipt;
pub mod reconciler;
pub mod returns;
pub mod saga;
pub mod session;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::Catalog;
pub use checkout::{Checkout, CheckoutReceipt, CheckoutRequest, PartialCommit};
pub use config::{ConfigError, EngineConfig};
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use ledger::BillLedger;
pub use receipt::{BusinessProfile, ReceiptView};
pub use reconciler::{
    AppliedAdjustment, ConcurrencyMode, ReconcileError, ReconcileReport, StockFailure,
    StockFailureReason, StockReconciler,
};
pub use returns::{ReturnOutcome, ReturnProcessor};
pub use saga::{SagaLog, SagaStep, StepOutcome};
pub use session::PosSession;
pub use store::{BillStore, CatalogStore, StoreError, StoreResult};
