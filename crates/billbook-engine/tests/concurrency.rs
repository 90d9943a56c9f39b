//! Two tills selling the same product at the same moment.
//!
//! ```text
//!   till A ── read stock 3 ──┐            ┌── write ──►
//!                            ├─ barrier ──┤
//!   till B ── read stock 3 ──┘            └── write ──►
//! ```
//!
//! Both reconcilers observe the same quantity before either writes. Blind
//! writes lose one decrement; optimistic writes retry and keep both.

mod common;

use billbook_core::PaymentMethod;
use billbook_engine::store::{GatedCatalogStore, MemoryBillStore, MemoryCatalogStore};
use billbook_engine::{
    CatalogStore, CheckoutRequest, ConcurrencyMode, Engine, EngineError, PosSession,
};
use std::sync::Arc;

use common::{config, grocery, sqlite_with, BESAN};

async fn two_tills_with_besan(engine: &Engine) -> (PosSession, PosSession) {
    let mut a = engine.open_session().await.unwrap();
    let mut b = engine.open_session().await.unwrap();
    a.add(BESAN).unwrap();
    b.add(BESAN).unwrap();
    (a, b)
}

async fn race(a: &mut PosSession, b: &mut PosSession) {
    let cash = CheckoutRequest::walk_in(PaymentMethod::Cash);
    let upi = CheckoutRequest::walk_in(PaymentMethod::Upi);
    let (first, second) = tokio::join!(a.checkout(&cash), b.checkout(&upi));
    first.unwrap();
    second.unwrap();
}

fn memory_engine(
    mode: ConcurrencyMode,
) -> (Engine, Arc<MemoryCatalogStore>, Arc<GatedCatalogStore>, Arc<MemoryBillStore>) {
    let products = Arc::new(MemoryCatalogStore::new(grocery()));
    let gated = Arc::new(GatedCatalogStore::new(products.clone()));
    let bills = Arc::new(MemoryBillStore::new());
    let engine = Engine::new(gated.clone(), bills.clone(), config(mode));
    (engine, products, gated, bills)
}

#[tokio::test]
async fn test_blind_writes_lose_an_update() {
    let (engine, products, gated, bills) = memory_engine(ConcurrencyMode::Blind);
    let (mut a, mut b) = two_tills_with_besan(&engine).await;

    gated.arm(2).await;
    race(&mut a, &mut b).await;

    // Two units sold, one decrement recorded
    assert_eq!(bills.len().await, 2);
    assert_eq!(products.quantity_of(BESAN).await, Some(2));
}

#[tokio::test]
async fn test_optimistic_writes_keep_both_sales() {
    let (engine, products, gated, bills) = memory_engine(ConcurrencyMode::Optimistic);
    let (mut a, mut b) = two_tills_with_besan(&engine).await;

    gated.arm(2).await;
    race(&mut a, &mut b).await;

    assert_eq!(bills.len().await, 2);
    assert_eq!(products.quantity_of(BESAN).await, Some(1));
}

#[tokio::test]
async fn test_optimistic_writes_on_sqlite() {
    let db = sqlite_with(grocery()).await;
    let gated = Arc::new(GatedCatalogStore::new(Arc::new(db.products())));
    let engine = Engine::new(
        gated.clone(),
        Arc::new(db.bills()),
        config(ConcurrencyMode::Optimistic),
    );
    let (mut a, mut b) = two_tills_with_besan(&engine).await;

    gated.arm(2).await;
    race(&mut a, &mut b).await;

    let besan = db.products().get_by_code(BESAN).await.unwrap().unwrap();
    assert_eq!(besan.quantity, 1);
    assert_eq!(db.bills().count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_bill_ids_unique_across_tills() {
    let (engine, _, _, _) = memory_engine(ConcurrencyMode::Optimistic);
    let (mut a, mut b) = two_tills_with_besan(&engine).await;

    let cash = CheckoutRequest::walk_in(PaymentMethod::Cash);
    let (first, second) = tokio::join!(a.checkout(&cash), b.checkout(&cash));
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_ne!(first.bill.bill.bill_id, second.bill.bill.bill_id);
}

#[tokio::test]
async fn test_last_unit_goes_to_one_till() {
    let (engine, products, _, bills) = memory_engine(ConcurrencyMode::Optimistic);
    let store: Arc<dyn CatalogStore> = products.clone();
    let besan = store.get(BESAN).await.unwrap().unwrap();
    store.set_quantity(&besan.product_id, 1).await.unwrap();

    let (mut a, mut b) = two_tills_with_besan(&engine).await;
    let cash = CheckoutRequest::walk_in(PaymentMethod::Cash);

    a.checkout(&cash).await.unwrap();
    let err = b.checkout(&cash).await.unwrap_err();

    assert!(matches!(err, EngineError::InsufficientStock { .. }));
    assert_eq!(bills.len().await, 1);
    assert_eq!(products.quantity_of(BESAN).await, Some(0));
}
