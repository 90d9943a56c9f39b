//! # Seed Data Generator
//!
//! Populates the database with a demo grocery catalog.
//!
//! ## Usage
//! ```bash
//! # Seed ./billbook_dev.db with every demo product
//! cargo run -p billbook-db --bin seed
//!
//! # Limit the number of products
//! cargo run -p billbook-db --bin seed -- --count 20
//!
//! # Specify database path
//! cargo run -p billbook-db --bin seed -- --db ./data/billbook.db
//! ```
//!
//! Product codes are 13-digit, EAN-shaped strings (`890` prefix, no valid
//! checksum) so a handheld scanner's output can be typed in by hand.

use billbook_core::{Category, Money, Product, ProductCode};
use billbook_db::{generate_product_id, Database, DbConfig};
use chrono::Utc;
use std::env;

/// `(category, subcategory, [(name, selling price in paise)])`
const CATALOG: &[(&str, &str, &[(&str, i64)])] = &[
    (
        "Staples",
        "Flour & Rice",
        &[
            ("Whole Wheat Atta 5kg", 28500),
            ("Basmati Rice 1kg", 14900),
            ("Sona Masoori Rice 5kg", 39900),
            ("Besan 500g", 6500),
        ],
    ),
    (
        "Staples",
        "Pulses",
        &[
            ("Toor Dal 1kg", 16500),
            ("Moong Dal 500g", 8900),
            ("Chana Dal 1kg", 11000),
            ("Masoor Dal 500g", 7200),
        ],
    ),
    (
        "Beverages",
        "Tea & Coffee",
        &[
            ("Assam Tea 250g", 14000),
            ("Filter Coffee 200g", 18500),
            ("Green Tea 25 bags", 16000),
        ],
    ),
    (
        "Snacks",
        "Biscuits",
        &[
            ("Glucose Biscuits 250g", 3000),
            ("Cream Biscuits 120g", 3500),
            ("Salted Crackers 200g", 4000),
        ],
    ),
    (
        "Household",
        "Cleaning",
        &[
            ("Dishwash Bar 300g", 3800),
            ("Detergent Powder 1kg", 12500),
            ("Floor Cleaner 500ml", 9900),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = usize::MAX;
    let mut db_path = String::from("./billbook_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(usize::MAX);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Billbook POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to insert (default: all)");
                println!("  -d, --db <PATH>    Database file path (default: ./billbook_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Billbook POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let mut generated = 0;
    let mut seq = 0;
    let start = std::time::Instant::now();

    'outer: for (category, subcategory, products) in CATALOG {
        for (name, price_minor) in products.iter() {
            if generated >= count {
                break 'outer;
            }
            seq += 1;

            let product = generate_product(category, subcategory, name, *price_minor, seq)?;

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.product_code, e);
                continue;
            }

            println!(
                "  {}  {:<28} {:>8}  stock {}",
                product.product_code,
                product.name,
                product.selling_price.to_string(),
                product.quantity
            );
            generated += 1;
        }
    }

    println!();
    println!("✓ Inserted {} products in {:?}", generated, start.elapsed());

    Ok(())
}

/// Builds one demo product. Stock cycles through 0..=12 so the catalog
/// contains an out-of-stock item.
fn generate_product(
    category: &str,
    subcategory: &str,
    name: &str,
    price_minor: i64,
    seq: usize,
) -> Result<Product, Box<dyn std::error::Error>> {
    let now = Utc::now();
    let product_code = ProductCode::parse(&format!("890{:010}", seq))?;

    Ok(Product {
        product_id: generate_product_id(),
        product_code,
        name: name.to_string(),
        selling_price: Money::from_minor(price_minor),
        // cost 70-85% of price
        cost_price: Money::from_minor(price_minor * (70 + (seq as i64 * 7) % 16) / 100),
        mrp: Money::from_minor(price_minor + price_minor / 10),
        category: Category {
            name: category.to_string(),
            subcategories: vec![subcategory.to_string()],
        },
        quantity: ((seq * 7) % 13) as i64,
        dealer_name: Some(format!("{} Wholesale", category)),
        version: 0,
        created_at: now,
        updated_at: now,
    })
}
