//! SQLite-backed stores: the `billbook-db` repositories behind the engine's
//! traits.

use async_trait::async_trait;
use billbook_core::{Bill, PersistedBill, Product};
use billbook_db::{BillRepository, ProductRepository};

use super::{BillStore, CatalogStore, StoreResult};

#[async_trait]
impl CatalogStore for ProductRepository {
    async fn get(&self, code: &str) -> StoreResult<Option<Product>> {
        Ok(self.get_by_code(code).await?)
    }

    async fn list_all(&self) -> StoreResult<Vec<Product>> {
        Ok(ProductRepository::list_all(self).await?)
    }

    async fn set_quantity(&self, product_id: &str, quantity: i64) -> StoreResult<()> {
        Ok(ProductRepository::set_quantity(self, product_id, quantity).await?)
    }

    async fn compare_and_set_quantity(
        &self,
        product_id: &str,
        quantity: i64,
        expected_version: i64,
    ) -> StoreResult<bool> {
        Ok(
            ProductRepository::compare_and_set_quantity(self, product_id, quantity, expected_version)
                .await?,
        )
    }
}

#[async_trait]
impl BillStore for BillRepository {
    async fn insert(&self, bill: &Bill) -> StoreResult<PersistedBill> {
        Ok(BillRepository::insert(self, bill).await?)
    }

    async fn list_ordered_by_date_desc(&self) -> StoreResult<Vec<PersistedBill>> {
        Ok(BillRepository::list_ordered_by_date_desc(self).await?)
    }

    async fn get_by_bill_id(&self, bill_id: &str) -> StoreResult<Option<PersistedBill>> {
        Ok(BillRepository::get_by_bill_id(self, bill_id).await?)
    }

    async fn list_returns_for(&self, original_bill_id: &str) -> StoreResult<Vec<PersistedBill>> {
        Ok(BillRepository::list_returns_for(self, original_bill_id).await?)
    }
}
