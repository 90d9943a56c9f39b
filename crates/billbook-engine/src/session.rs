//! # POS Session
//!
//! One till: one cart, one catalog snapshot, shared stores.
//!
//! ```text
//!   scan / add / adjust / remove ──► Cart ◄── reads ── CatalogSnapshot
//!            │                                               ▲
//!            ▼                                               │ refresh
//!   totals() (recomputed)                                    │
//!            │                                               │
//!   checkout(request) ──► Checkout saga ─────────────────────┘
//!   process_return(..) ──► ReturnProcessor ──────────────────┘
//! ```
//!
//! A session is owned by a single task; nothing inside it is locked.

use billbook_core::{
    CatalogSnapshot, Cart, LineItem, PersistedBill, Product, ReturnSelection, ScanError,
    StockAdjustment, Totals,
};

use crate::catalog::Catalog;
use crate::checkout::{Checkout, CheckoutReceipt, CheckoutRequest};
use crate::error::EngineResult;
use crate::ledger::BillLedger;
use crate::reconciler::{ReconcileError, ReconcileReport};
use crate::returns::{ReturnOutcome, ReturnProcessor};

pub struct PosSession {
    cart: Cart,
    catalog: Catalog,
    checkout: Checkout,
    returns: ReturnProcessor,
    ledger: BillLedger,
}

impl PosSession {
    pub fn new(
        cart: Cart,
        catalog: Catalog,
        checkout: Checkout,
        returns: ReturnProcessor,
        ledger: BillLedger,
    ) -> Self {
        PosSession {
            cart,
            catalog,
            checkout,
            returns,
            ledger,
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Feeds a barcode capability result into the cart.
    pub fn scan(&mut self, scanned: Result<&str, ScanError>) -> EngineResult<LineItem> {
        let line = self.cart.submit_scan(self.catalog.snapshot(), scanned)?;
        Ok(line.clone())
    }

    /// Adds one unit by typed code.
    pub fn add(&mut self, code: &str) -> EngineResult<LineItem> {
        let line = self.cart.add_by_code(self.catalog.snapshot(), code)?;
        Ok(line.clone())
    }

    /// Adds one unit of a product picked from a list.
    pub fn add_product(&mut self, product: &Product) -> EngineResult<LineItem> {
        let line = self.cart.add_by_product(product)?;
        Ok(line.clone())
    }

    /// Changes a line's quantity by `delta`; returns the new quantity.
    pub fn adjust(&mut self, code: &str, delta: i64) -> EngineResult<i64> {
        Ok(self
            .cart
            .adjust_quantity(self.catalog.snapshot(), code, delta)?)
    }

    pub fn remove(&mut self, code: &str) -> Option<LineItem> {
        self.cart.remove_line(code)
    }

    pub fn totals(&self) -> Totals {
        self.cart.totals()
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        self.catalog.snapshot()
    }

    pub async fn refresh_catalog(&mut self) -> EngineResult<()> {
        self.catalog.refresh().await?;
        Ok(())
    }

    // =========================================================================
    // Bills
    // =========================================================================

    pub async fn checkout(&mut self, request: &CheckoutRequest) -> EngineResult<CheckoutReceipt> {
        self.checkout
            .run(&mut self.cart, &mut self.catalog, request)
            .await
    }

    /// Retries the stock adjustments left pending by a partial commit.
    pub async fn resume_stock(
        &mut self,
        pending: &[StockAdjustment],
    ) -> Result<ReconcileReport, ReconcileError> {
        self.checkout.resume_stock(&mut self.catalog, pending).await
    }

    pub async fn process_return(
        &mut self,
        original_bill_id: &str,
        selection: &ReturnSelection,
    ) -> EngineResult<ReturnOutcome> {
        self.returns
            .process(&mut self.catalog, original_bill_id, selection)
            .await
    }

    /// Bill history, newest first.
    pub async fn bills(&self) -> EngineResult<Vec<PersistedBill>> {
        Ok(self.ledger.list_all().await?)
    }

    pub async fn bill(&self, bill_id: &str) -> EngineResult<Option<PersistedBill>> {
        Ok(self.ledger.get(bill_id).await?)
    }
}
