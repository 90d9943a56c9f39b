use chrono::Utc;

use crate::money::Money;
use crate::types::{Category, Product, ProductCode};

pub(crate) fn product(code: &str, name: &str, price_minor: i64, quantity: i64) -> Product {
    let now = Utc::now();
    Product {
        product_id: uuid::Uuid::new_v4().to_string(),
        product_code: ProductCode::parse(code).unwrap(),
        name: name.to_string(),
        selling_price: Money::from_minor(price_minor),
        cost_price: Money::from_minor(price_minor * 8 / 10),
        mrp: Money::from_minor(price_minor),
        category: Category::default(),
        quantity,
        dealer_name: None,
        version: 0,
        created_at: now,
        updated_at: now,
    }
}
