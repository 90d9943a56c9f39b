//! # Engine
//!
//! Shared wiring: stores, configuration and the bill-id generator.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Engine (Clone, shared across tills in one process)                     │
//! │    ├── Arc<dyn CatalogStore>                                            │
//! │    ├── Arc<dyn BillStore>                                               │
//! │    ├── Arc<EngineConfig>                                                │
//! │    └── Arc<BillIdGenerator>   one per process, so ids never collide     │
//! │                                                                         │
//! │  open_session() ──► PosSession { Cart, Catalog, Checkout, Returns }     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billbook_core::{BillIdGenerator, Cart, PersistedBill};
use billbook_db::Database;
use std::sync::Arc;
use tracing::info;

use crate::catalog::Catalog;
use crate::checkout::Checkout;
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::ledger::BillLedger;
use crate::receipt::ReceiptView;
use crate::reconciler::StockReconciler;
use crate::returns::ReturnProcessor;
use crate::session::PosSession;
use crate::store::{BillStore, CatalogStore};

#[derive(Clone)]
pub struct Engine {
    catalog_store: Arc<dyn CatalogStore>,
    bill_store: Arc<dyn BillStore>,
    config: Arc<EngineConfig>,
    ids: Arc<BillIdGenerator>,
}

impl Engine {
    pub fn new(
        catalog_store: Arc<dyn CatalogStore>,
        bill_store: Arc<dyn BillStore>,
        config: EngineConfig,
    ) -> Self {
        let ids = BillIdGenerator::new(
            config.billing.bill_prefix.clone(),
            config.billing.device_code.clone(),
        );
        info!(
            tax_rate = %config.tax_rate(),
            stock_writes = %config.stock.writes,
            device_code = %config.billing.device_code,
            "Billing engine ready"
        );

        Engine {
            catalog_store,
            bill_store,
            config: Arc::new(config),
            ids: Arc::new(ids),
        }
    }

    /// Engine over the SQLite repositories.
    pub fn from_database(db: &Database, config: EngineConfig) -> Self {
        Engine::new(Arc::new(db.products()), Arc::new(db.bills()), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> BillLedger {
        BillLedger::new(Arc::clone(&self.bill_store))
    }

    pub fn reconciler(&self) -> StockReconciler {
        StockReconciler::new(
            Arc::clone(&self.catalog_store),
            self.config.stock.writes,
            self.config.stock.max_write_attempts,
        )
    }

    pub fn checkout(&self) -> Checkout {
        Checkout::new(self.ledger(), self.reconciler(), Arc::clone(&self.ids))
    }

    pub fn returns(&self) -> ReturnProcessor {
        ReturnProcessor::new(self.ledger(), self.reconciler())
    }

    /// Opens a till with an empty cart and a freshly loaded catalog.
    pub async fn open_session(&self) -> EngineResult<PosSession> {
        let catalog = Catalog::load(Arc::clone(&self.catalog_store)).await?;
        info!(products = catalog.snapshot().len(), "Session opened");

        Ok(PosSession::new(
            Cart::new(self.config.tax_rate()),
            catalog,
            self.checkout(),
            self.returns(),
            self.ledger(),
        ))
    }

    /// Printable view of a bill with this shop's details.
    pub fn receipt(&self, bill: &PersistedBill) -> ReceiptView {
        ReceiptView::new(bill, &self.config.business, &self.config.billing.tax_name)
    }
}
