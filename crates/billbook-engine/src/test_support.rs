use billbook_core::{
    compute_totals, Bill, BillItem, Category, LineItem, Money, PaymentMethod, Product, ProductCode,
    TaxRate,
};
use chrono::Utc;

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

/// A consistent sale bill at 18% for `(code, quantity, unit price)` lines.
pub(crate) fn sale_bill(bill_id: &str, lines: &[(&str, i64, i64)]) -> Bill {
    let lines: Vec<LineItem> = lines
        .iter()
        .map(|(code, quantity, price)| LineItem {
            product_code: ProductCode::parse(code).unwrap(),
            product_name: format!("Product {}", code),
            unit_price: Money::from_minor(*price),
            quantity: *quantity,
        })
        .collect();
    let rate = TaxRate::from_bps(1800);
    let totals = compute_totals(&lines, rate);

    Bill {
        bill_id: bill_id.to_string(),
        date: Utc::now(),
        items: lines.iter().map(BillItem::from).collect(),
        subtotal: totals.subtotal,
        tax: totals.tax,
        total: totals.total,
        tax_rate: rate,
        customer_name: String::new(),
        customer_phone: None,
        payment_method: PaymentMethod::Cash,
        is_return: false,
        original_bill_id: None,
    }
}
