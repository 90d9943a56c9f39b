//! # In-Memory Stores
//!
//! Process-local implementations of the store traits with fault injection.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MemoryCatalogStore   products keyed by code, version bumped per write │
//! │    fail_writes_for(code)  → every write to that product errors         │
//! │    fail_list_all(true)    → snapshot refresh errors                    │
//! │                                                                         │
//! │  MemoryBillStore      append-only Vec<PersistedBill>                   │
//! │    fail_inserts(true)     → ledger writes error, nothing stored        │
//! │                                                                         │
//! │  GatedCatalogStore    decorator: the next N `get` calls wait for each  │
//! │                       other after reading, so N sessions observe the   │
//! │                       same stock before any of them writes             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use billbook_core::{Bill, PersistedBill, Product};
use billbook_db::DbError;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Barrier, Mutex};
use tracing::debug;
use uuid::Uuid;

use super::{BillStore, CatalogStore, StoreError, StoreResult};

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Default)]
struct CatalogState {
    products: BTreeMap<String, Product>,
    failing_writes: HashSet<String>,
    fail_list_all: bool,
}

impl CatalogState {
    fn by_id_mut(&mut self, product_id: &str) -> StoreResult<&mut Product> {
        let product = self
            .products
            .values_mut()
            .find(|p| p.product_id == product_id)
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        if self.failing_writes.contains(product.product_code.as_str()) {
            return Err(StoreError::Unavailable(format!(
                "write to {} rejected",
                product.product_code
            )));
        }

        Ok(product)
    }
}

/// Catalog store held in memory.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    state: Mutex<CatalogState>,
}

impl MemoryCatalogStore {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products
            .into_iter()
            .map(|p| (p.product_code.to_string(), p))
            .collect();

        MemoryCatalogStore {
            state: Mutex::new(CatalogState {
                products,
                ..CatalogState::default()
            }),
        }
    }

    /// Adds or replaces a product.
    pub async fn upsert(&self, product: Product) {
        let mut state = self.state.lock().await;
        state.products.insert(product.product_code.to_string(), product);
    }

    /// Deletes a product, as a catalog edit outside the till would.
    pub async fn remove(&self, code: &str) -> Option<Product> {
        self.state.lock().await.products.remove(code)
    }

    /// Current stock for `code`, bypassing any injected faults.
    pub async fn quantity_of(&self, code: &str) -> Option<i64> {
        self.state.lock().await.products.get(code).map(|p| p.quantity)
    }

    /// Makes every stock write to `code` fail until cleared.
    pub async fn fail_writes_for(&self, code: &str) {
        self.state.lock().await.failing_writes.insert(code.to_string());
    }

    pub async fn fail_list_all(&self, fail: bool) {
        self.state.lock().await.fail_list_all = fail;
    }

    /// Removes every injected fault.
    pub async fn clear_faults(&self) {
        let mut state = self.state.lock().await;
        state.failing_writes.clear();
        state.fail_list_all = false;
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn get(&self, code: &str) -> StoreResult<Option<Product>> {
        Ok(self.state.lock().await.products.get(code.trim()).cloned())
    }

    async fn list_all(&self) -> StoreResult<Vec<Product>> {
        let state = self.state.lock().await;
        if state.fail_list_all {
            return Err(StoreError::Unavailable("catalog listing rejected".to_string()));
        }
        Ok(state.products.values().cloned().collect())
    }

    async fn set_quantity(&self, product_id: &str, quantity: i64) -> StoreResult<()> {
        if quantity < 0 {
            return Err(negative_stock(product_id));
        }

        let mut state = self.state.lock().await;
        let product = state.by_id_mut(product_id)?;
        product.quantity = quantity;
        product.version += 1;
        product.updated_at = Utc::now();
        Ok(())
    }

    async fn compare_and_set_quantity(
        &self,
        product_id: &str,
        quantity: i64,
        expected_version: i64,
    ) -> StoreResult<bool> {
        if quantity < 0 {
            return Err(negative_stock(product_id));
        }

        let mut state = self.state.lock().await;
        let product = match state.by_id_mut(product_id) {
            Ok(product) => product,
            Err(StoreError::Database(DbError::NotFound { .. })) => return Ok(false),
            Err(e) => return Err(e),
        };

        if product.version != expected_version {
            debug!(
                product_id = %product_id,
                expected_version,
                actual_version = product.version,
                "Stale stock write rejected"
            );
            return Ok(false);
        }

        product.quantity = quantity;
        product.version += 1;
        product.updated_at = Utc::now();
        Ok(true)
    }
}

fn negative_stock(product_id: &str) -> StoreError {
    DbError::CheckViolation {
        message: format!("negative stock for product {}", product_id),
    }
    .into()
}

// =============================================================================
// Read Gate
// =============================================================================

#[derive(Debug)]
struct Gate {
    barrier: Arc<Barrier>,
    remaining: usize,
}

/// Wraps a catalog store so that concurrent sessions can be lined up on a
/// stale read.
///
/// After [`arm`](Self::arm)`(n)`, each of the next `n` `get` calls reads from
/// the inner store and then waits until all `n` have read. Later calls pass
/// straight through.
pub struct GatedCatalogStore {
    inner: Arc<dyn CatalogStore>,
    gate: Mutex<Option<Gate>>,
}

impl GatedCatalogStore {
    pub fn new(inner: Arc<dyn CatalogStore>) -> Self {
        GatedCatalogStore {
            inner,
            gate: Mutex::new(None),
        }
    }

    /// Holds the next `readers` product reads at a shared barrier.
    pub async fn arm(&self, readers: usize) {
        *self.gate.lock().await = Some(Gate {
            barrier: Arc::new(Barrier::new(readers)),
            remaining: readers,
        });
    }

    async fn take_slot(&self) -> Option<Arc<Barrier>> {
        let mut slot = self.gate.lock().await;
        let gate = slot.as_mut()?;
        gate.remaining -= 1;
        let barrier = Arc::clone(&gate.barrier);
        if gate.remaining == 0 {
            *slot = None;
        }
        Some(barrier)
    }
}

#[async_trait]
impl CatalogStore for GatedCatalogStore {
    async fn get(&self, code: &str) -> StoreResult<Option<Product>> {
        let barrier = self.take_slot().await;
        let product = self.inner.get(code).await?;
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        Ok(product)
    }

    async fn list_all(&self) -> StoreResult<Vec<Product>> {
        self.inner.list_all().await
    }

    async fn set_quantity(&self, product_id: &str, quantity: i64) -> StoreResult<()> {
        self.inner.set_quantity(product_id, quantity).await
    }

    async fn compare_and_set_quantity(
        &self,
        product_id: &str,
        quantity: i64,
        expected_version: i64,
    ) -> StoreResult<bool> {
        self.inner
            .compare_and_set_quantity(product_id, quantity, expected_version)
            .await
    }
}

// =============================================================================
// Ledger
// =============================================================================

#[derive(Debug, Default)]
struct LedgerState {
    bills: Vec<PersistedBill>,
    fail_inserts: bool,
}

/// Bill ledger held in memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryBillStore {
    state: Mutex<LedgerState>,
}

impl MemoryBillStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every insert fail (nothing is stored) until turned off.
    pub async fn fail_inserts(&self, fail: bool) {
        self.state.lock().await.fail_inserts = fail;
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.bills.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BillStore for MemoryBillStore {
    async fn insert(&self, bill: &Bill) -> StoreResult<PersistedBill> {
        let mut state = self.state.lock().await;

        if state.fail_inserts {
            return Err(StoreError::Unavailable("ledger write rejected".to_string()));
        }
        if state.bills.iter().any(|b| b.bill.bill_id == bill.bill_id) {
            return Err(DbError::duplicate("bill_id", &bill.bill_id).into());
        }

        let persisted = PersistedBill {
            id: Uuid::new_v4().to_string(),
            bill: bill.clone(),
        };
        state.bills.push(persisted.clone());
        Ok(persisted)
    }

    async fn list_ordered_by_date_desc(&self) -> StoreResult<Vec<PersistedBill>> {
        let mut bills = self.state.lock().await.bills.clone();
        bills.sort_by(|a, b| {
            b.bill
                .date
                .cmp(&a.bill.date)
                .then_with(|| b.bill.bill_id.cmp(&a.bill.bill_id))
        });
        Ok(bills)
    }

    async fn get_by_bill_id(&self, bill_id: &str) -> StoreResult<Option<PersistedBill>> {
        let state = self.state.lock().await;
        Ok(state.bills.iter().find(|b| b.bill.bill_id == bill_id).cloned())
    }

    async fn list_returns_for(&self, original_bill_id: &str) -> StoreResult<Vec<PersistedBill>> {
        let state = self.state.lock().await;
        Ok(state
            .bills
            .iter()
            .filter(|b| {
                b.bill.is_return && b.bill.original_bill_id.as_deref() == Some(original_bill_id)
            })
            .cloned()
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
