//! # Bill Ledger
//!
//! Append-only history of sales and returns.
//!
//! Bills are never updated or deleted; a reversal is a new bill linked
//! through `original_bill_id`.

use billbook_core::{Bill, PersistedBill};
use std::sync::Arc;
use tracing::{debug, info};

use crate::store::{BillStore, StoreResult};

#[derive(Clone)]
pub struct BillLedger {
    store: Arc<dyn BillStore>,
}

impl BillLedger {
    pub fn new(store: Arc<dyn BillStore>) -> Self {
        BillLedger { store }
    }

    /// Persists a bill with all of its items in one write.
    ///
    /// On error nothing may be assumed written.
    pub async fn create(&self, bill: &Bill) -> StoreResult<PersistedBill> {
        debug!(bill_id = %bill.bill_id, is_return = bill.is_return, "Recording bill");
        let persisted = self.store.insert(bill).await?;
        info!(
            bill_id = %persisted.bill.bill_id,
            id = %persisted.id,
            total = %persisted.bill.total,
            "Bill recorded"
        );
        Ok(persisted)
    }

    /// Every bill, newest first, as of the time of the call.
    pub async fn list_all(&self) -> StoreResult<Vec<PersistedBill>> {
        self.store.list_ordered_by_date_desc().await
    }

    pub async fn get(&self, bill_id: &str) -> StoreResult<Option<PersistedBill>> {
        self.store.get_by_bill_id(bill_id.trim()).await
    }

    /// Returns already recorded against `original_bill_id`, oldest first.
    pub async fn returns_for(&self, original_bill_id: &str) -> StoreResult<Vec<Bill>> {
        Ok(self
            .store
            .list_returns_for(original_bill_id)
            .await?
            .into_iter()
            .map(|p| p.bill)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBillStore;
    use crate::test_support::sale_bill;
    use chrono::Duration;

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let ledger = BillLedger::new(Arc::new(MemoryBillStore::new()));

        let mut older = sale_bill("BILL-1-01", &[("A", 1, 1000)]);
        older.date -= Duration::minutes(5);
        let newer = sale_bill("BILL-2-01", &[("B", 2, 500)]);

        ledger.create(&older).await.unwrap();
        ledger.create(&newer).await.unwrap();

        let ids: Vec<String> = ledger
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.bill.bill_id)
            .collect();
        assert_eq!(ids, vec!["BILL-2-01", "BILL-1-01"]);
    }

    #[tokio::test]
    async fn test_get_unknown_bill() {
        let ledger = BillLedger::new(Arc::new(MemoryBillStore::new()));
        assert!(ledger.get("BILL-404-01").await.unwrap().is_none());
    }
}
