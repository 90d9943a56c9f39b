//! # Catalog Snapshot
//!
//! An in-memory, code-keyed view of every product, taken at one instant.
//!
//! The snapshot is plain data: it is built by whoever reads the catalog store
//! (see `billbook-engine::catalog`) and handed explicitly to the cart. There
//! is no global catalog; a stale snapshot is replaced wholesale, never patched.
//!
//! ```text
//!   CatalogStore::list_all() ──► CatalogSnapshot::from_products(..)
//!                                      │
//!             Cart::add_by_code ◄──────┤ get(code)
//!             Cart::adjust_quantity ◄──┤ stock_of(code)
//!             Checkout re-validation ◄─┘ (fresh snapshot)
//! ```

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::types::{Product, ProductCode};

/// Products keyed by code, plus the time they were read.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    products: HashMap<ProductCode, Product>,
    refreshed_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    /// Builds a snapshot. If two products share a code the later one wins;
    /// the store's unique index makes that a data-corruption case only.
    pub fn from_products(products: impl IntoIterator<Item = Product>, at: DateTime<Utc>) -> Self {
        let products = products
            .into_iter()
            .map(|p| (p.product_code.clone(), p))
            .collect();

        CatalogSnapshot {
            products,
            refreshed_at: at,
        }
    }

    /// An empty snapshot (nothing loaded yet).
    pub fn empty() -> Self {
        CatalogSnapshot {
            products: HashMap::new(),
            refreshed_at: Utc::now(),
        }
    }

    /// Looks up a product by code. Surrounding whitespace is ignored.
    pub fn get(&self, code: &str) -> Option<&Product> {
        self.products.get(code.trim())
    }

    /// Stock quantity of `code` as of this snapshot.
    pub fn stock_of(&self, code: &str) -> Option<i64> {
        self.get(code).map(|p| p.quantity)
    }

    /// All products, sorted by name (for manual selection lists).
    pub fn products(&self) -> Vec<&Product> {
        let mut products: Vec<&Product> = self.products.values().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn refreshed_at(&self) -> DateTime<Utc> {
        self.refreshed_at
    }
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        CatalogSnapshot::empty()
    }
}
