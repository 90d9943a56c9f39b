//! # Catalog
//!
//! Owns one session's [`CatalogSnapshot`] and knows how to replace it.
//!
//! ```text
//!   Catalog::load(store)      ──► list_all() ──► snapshot #1
//!   cart.add_by_code(catalog.snapshot(), ..)      reads #1
//!   Catalog::refresh()        ──► list_all() ──► snapshot #2 (wholesale)
//! ```
//!
//! A failed refresh keeps the previous snapshot.

use billbook_core::CatalogSnapshot;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use crate::store::{CatalogStore, StoreResult};

pub struct Catalog {
    store: Arc<dyn CatalogStore>,
    snapshot: CatalogSnapshot,
}

impl Catalog {
    /// A catalog with an empty snapshot; call [`refresh`](Self::refresh)
    /// before use.
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Catalog {
            store,
            snapshot: CatalogSnapshot::empty(),
        }
    }

    /// Creates a catalog and takes its first snapshot.
    pub async fn load(store: Arc<dyn CatalogStore>) -> StoreResult<Self> {
        let mut catalog = Catalog::new(store);
        catalog.refresh().await?;
        Ok(catalog)
    }

    /// Re-reads every product and swaps the snapshot in.
    pub async fn refresh(&mut self) -> StoreResult<&CatalogSnapshot> {
        let products = self.store.list_all().await?;
        self.snapshot = CatalogSnapshot::from_products(products, Utc::now());
        debug!(products = self.snapshot.len(), "Catalog snapshot refreshed");
        Ok(&self.snapshot)
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCatalogStore;
    use crate::test_support::product;

    #[tokio::test]
    async fn test_refresh_replaces_snapshot() {
        let memory = Arc::new(MemoryCatalogStore::new([product("A", "Atta", 10_000, 5)]));
        let mut catalog = Catalog::load(memory.clone()).await.unwrap();
        assert_eq!(catalog.snapshot().stock_of("A"), Some(5));

        memory.upsert(product("B", "Besan", 6_500, 2)).await;
        memory.remove("A").await;
        // Old snapshot is untouched until refresh
        assert_eq!(catalog.snapshot().stock_of("A"), Some(5));

        let snapshot = catalog.refresh().await.unwrap();
        assert!(snapshot.get("A").is_none());
        assert_eq!(snapshot.stock_of("B"), Some(2));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let memory = Arc::new(MemoryCatalogStore::new([product("A", "Atta", 10_000, 5)]));
        let mut catalog = Catalog::load(memory.clone()).await.unwrap();

        memory.fail_list_all(true).await;
        assert!(catalog.refresh().await.is_err());
        assert_eq!(catalog.snapshot().stock_of("A"), Some(5));
    }
}
