//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use billbook_core::{Category, Money, Product, ProductCode};
use billbook_db::{generate_product_id, Database, DbConfig};
use billbook_engine::{ConcurrencyMode, EngineConfig};
use chrono::Utc;

pub fn product(code: &str, name: &str, price_minor: i64, quantity: i64) -> Product {
    let now = Utc::now();
    Product {
        product_id: generate_product_id(),
        product_code: ProductCode::parse(code).unwrap(),
        name: name.to_string(),
        selling_price: Money::from_minor(price_minor),
        cost_price: Money::from_minor(price_minor * 8 / 10),
        mrp: Money::from_minor(price_minor),
        category: Category {
            name: "Staples".to_string(),
            subcategories: vec!["Flour & Rice".to_string()],
        },
        quantity,
        dealer_name: None,
        version: 0,
        created_at: now,
        updated_at: now,
    }
}

/// `Atta` 10.00 × 5, `Besan` 5.00 × 3, `Chana` 11.00 × 0.
pub fn grocery() -> Vec<Product> {
    vec![
        product("8900000000001", "Atta", 1000, 5),
        product("8900000000002", "Besan", 500, 3),
        product("8900000000003", "Chana", 1100, 0),
    ]
}

pub const ATTA: &str = "8900000000001";
pub const BESAN: &str = "8900000000002";
pub const CHANA: &str = "8900000000003";

/// In-memory SQLite with `products` inserted.
pub async fn sqlite_with(products: Vec<Product>) -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    for product in products {
        db.products().insert(&product).await.unwrap();
    }
    db
}

pub fn config(mode: ConcurrencyMode) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.stock.writes = mode;
    config
}
