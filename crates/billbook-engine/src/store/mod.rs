//! # Store Traits
//!
//! The two independent records the engine coordinates.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Storage Seams                                  │
//! │                                                                         │
//! │   ┌─────────────────────────┐        ┌─────────────────────────┐       │
//! │   │ CatalogStore            │        │ BillStore               │       │
//! │   │  get(code)              │        │  insert(bill)           │       │
//! │   │  list_all()             │        │  list_ordered_by_date…  │       │
//! │   │  set_quantity(id, qty)  │        │  get_by_bill_id(id)     │       │
//! │   │  compare_and_set_…      │        │  list_returns_for(id)   │       │
//! │   └────────────┬────────────┘        └────────────┬────────────┘       │
//! │                │                                  │                    │
//! │        ┌───────┴────────┐                 ┌───────┴────────┐           │
//! │        ▼                ▼                 ▼                ▼           │
//! │   ProductRepository  MemoryCatalog   BillRepository   MemoryBills      │
//! │   (SQLite)           Store           (SQLite)         Store            │
//! │                                                                         │
//! │   No transaction spans the two. Every method is a single-record op.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use billbook_core::{Bill, PersistedBill, Product};
use billbook_db::DbError;
use thiserror::Error;

pub use memory::{GatedCatalogStore, MemoryBillStore, MemoryCatalogStore};

/// Failure reading or writing either store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] DbError),

    /// The store refused the operation (injected faults, closed backends).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Per-product catalog access used by the snapshot and the reconciler.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Looks a product up by its business code.
    async fn get(&self, code: &str) -> StoreResult<Option<Product>>;

    /// Every product, for a wholesale snapshot refresh.
    async fn list_all(&self) -> StoreResult<Vec<Product>>;

    /// Unconditionally overwrites stock (last writer wins).
    async fn set_quantity(&self, product_id: &str, quantity: i64) -> StoreResult<()>;

    /// Writes stock only if the product is still at `expected_version`.
    /// Returns `false` when another writer got there first.
    async fn compare_and_set_quantity(
        &self,
        product_id: &str,
        quantity: i64,
        expected_version: i64,
    ) -> StoreResult<bool>;
}

/// Append-only bill ledger.
#[async_trait]
pub trait BillStore: Send + Sync {
    /// Writes the bill and its items as one record.
    async fn insert(&self, bill: &Bill) -> StoreResult<PersistedBill>;

    async fn list_ordered_by_date_desc(&self) -> StoreResult<Vec<PersistedBill>>;

    async fn get_by_bill_id(&self, bill_id: &str) -> StoreResult<Option<PersistedBill>>;

    /// Returns recorded against `original_bill_id`, oldest first.
    async fn list_returns_for(&self, original_bill_id: &str) -> StoreResult<Vec<PersistedBill>>;
}
