//! # Product Repository
//!
//! Catalog reads and per-product stock writes.
//!
//! ## Stock Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Ways To Write Stock                              │
//! │                                                                         │
//! │  set_quantity(id, 7)                                                   │
//! │     UPDATE products SET quantity = 7, version = version + 1            │
//! │     WHERE id = ?                          ← last writer wins           │
//! │                                                                         │
//! │  compare_and_set_quantity(id, 7, expected_version = 4)                 │
//! │     UPDATE products SET quantity = 7, version = version + 1            │
//! │     WHERE id = ? AND version = 4          ← 0 rows → somebody else     │
//! │                                              wrote first, re-read      │
//! │                                                                         │
//! │  Either way SQLite refuses quantity < 0 (CHECK constraint).            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billbook_core::validation::{
    validate_price_minor, validate_product_name, validate_stock_quantity, validate_uuid,
};
use billbook_core::ValidationError;
use billbook_core::{Category, Money, Product, ProductCode};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str = r#"
    id,
    product_code,
    name,
    selling_price_minor,
    cost_price_minor,
    mrp_minor,
    category_name,
    subcategories,
    quantity,
    dealer_name,
    version,
    created_at,
    updated_at
"#;

/// A `products` row as stored.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    product_code: String,
    name: String,
    selling_price_minor: i64,
    cost_price_minor: i64,
    mrp_minor: i64,
    category_name: String,
    subcategories: String,
    quantity: i64,
    dealer_name: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let product_code =
            ProductCode::parse(&row.product_code).map_err(|e| DbError::corrupt("Product", e))?;
        let subcategories: Vec<String> =
            serde_json::from_str(&row.subcategories).map_err(|e| DbError::corrupt("Product", e))?;

        Ok(Product {
            product_id: row.id,
            product_code,
            name: row.name,
            selling_price: Money::from_minor(row.selling_price_minor),
            cost_price: Money::from_minor(row.cost_price_minor),
            mrp: Money::from_minor(row.mrp_minor),
            category: Category {
                name: row.category_name,
                subcategories,
            },
            quantity: row.quantity,
            dealer_name: row.dealer_name,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.get_by_code("8901063010017").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its storage ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        validate_uuid(id).map_err(|e| DbError::QueryFailed(e.to_string()))?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Gets a product by its scan-matchable code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let code = code.trim();
        debug!(product_code = %code, "Looking up product");

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE product_code = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Lists every product, sorted by name.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, product_code"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed products");
        rows.into_iter().map(Product::try_from).collect()
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The product as stored
    /// * `Err(DbError::UniqueViolation)` - Code already exists
    /// * `Err(DbError::CheckViolation)` - Blank name, negative price or stock
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(product_code = %product.product_code, "Inserting product");
        validate_new_product(product).map_err(|e| DbError::CheckViolation {
            message: e.to_string(),
        })?;

        let subcategories = serde_json::to_string(&product.category.subcategories)
            .map_err(|e| DbError::Internal(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                id, product_code, name,
                selling_price_minor, cost_price_minor, mrp_minor,
                category_name, subcategories,
                quantity, dealer_name, version,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6,
                ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13
            )
            "#,
        )
        .bind(&product.product_id)
        .bind(product.product_code.as_str())
        .bind(&product.name)
        .bind(product.selling_price.minor())
        .bind(product.cost_price.minor())
        .bind(product.mrp.minor())
        .bind(&product.category.name)
        .bind(subcategories)
        .bind(product.quantity)
        .bind(&product.dealer_name)
        .bind(product.version)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(product.clone()),
            Err(err) => match DbError::from(err) {
                DbError::UniqueViolation { field, .. } => {
                    Err(DbError::duplicate(field, product.product_code.as_str()))
                }
                other => Err(other),
            },
        }
    }

    /// Overwrites a product's stock level (no version check).
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::CheckViolation)` - `quantity` is negative
    pub async fn set_quantity(&self, id: &str, quantity: i64) -> DbResult<()> {
        debug!(id = %id, quantity = %quantity, "Setting stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                quantity = ?2,
                version = version + 1,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Writes a product's stock level only if nobody has written it since
    /// `expected_version` was read.
    ///
    /// ## Returns
    /// * `Ok(true)` - Written; version is now `expected_version + 1`
    /// * `Ok(false)` - Version moved on (or the product is gone); re-read
    pub async fn compare_and_set_quantity(
        &self,
        id: &str,
        quantity: i64,
        expected_version: i64,
    ) -> DbResult<bool> {
        debug!(
            id = %id,
            quantity = %quantity,
            expected_version = %expected_version,
            "Compare-and-set stock"
        );

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                quantity = ?2,
                version = version + 1,
                updated_at = ?4
            WHERE id = ?1 AND version = ?3
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(expected_version)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn validate_new_product(product: &Product) -> Result<(), ValidationError> {
    validate_product_name(&product.name)?;
    validate_price_minor(product.selling_price.minor())?;
    validate_price_minor(product.cost_price.minor())?;
    validate_price_minor(product.mrp.minor())?;
    validate_stock_quantity(product.quantity)
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn product(code: &str, name: &str, quantity: i64) -> Product {
        let now = Utc::now();
        Product {
            product_id: generate_product_id(),
            product_code: ProductCode::parse(code).unwrap(),
            name: name.to_string(),
            selling_price: Money::from_minor(4000),
            cost_price: Money::from_minor(3200),
            mrp: Money::from_minor(4500),
            category: Category {
                name: "Grocery".to_string(),
                subcategories: vec!["Staples".to_string()],
            },
            quantity,
            dealer_name: Some("Sharma Traders".to_string()),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    async fn repo() -> ProductRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().products()
    }

    #[tokio::test]
    async fn test_insert_and_read_back() {
        let repo = repo().await;
        let atta = product("8901063010017", "Atta 1kg", 12);
        repo.insert(&atta).await.unwrap();

        let by_code = repo.get_by_code(" 8901063010017 ").await.unwrap().unwrap();
        assert_eq!(by_code.name, "Atta 1kg");
        assert_eq!(by_code.category.subcategories, vec!["Staples".to_string()]);
        assert_eq!(by_code.dealer_name.as_deref(), Some("Sharma Traders"));

        let by_id = repo.get_by_id(&atta.product_id).await.unwrap().unwrap();
        assert_eq!(by_id.product_code, atta.product_code);

        assert!(repo.get_by_code("missing").await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let repo = repo().await;
        repo.insert(&product("A1", "Rice", 1)).await.unwrap();

        let err = repo.insert(&product("A1", "Rice again", 1)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { value, .. } if value == "A1"));
    }

    #[tokio::test]
    async fn test_invalid_product_rejected() {
        let repo = repo().await;
        let mut blank = product("C1", "Salt", 1);
        blank.name = "  ".to_string();
        assert!(matches!(
            repo.insert(&blank).await,
            Err(DbError::CheckViolation { .. })
        ));

        let negative = product("C2", "Salt", -1);
        assert!(matches!(
            repo.insert(&negative).await,
            Err(DbError::CheckViolation { .. })
        ));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_all_sorted_by_name() {
        let repo = repo().await;
        repo.insert(&product("B", "Sugar", 1)).await.unwrap();
        repo.insert(&product("A", "Dal", 1)).await.unwrap();

        let names: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Dal".to_string(), "Sugar".to_string()]);
    }

    #[tokio::test]
    async fn test_set_quantity_bumps_version() {
        let repo = repo().await;
        let tea = product("TEA", "Tea 250g", 10);
        repo.insert(&tea).await.unwrap();

        repo.set_quantity(&tea.product_id, 7).await.unwrap();
        let stored = repo.get_by_code("TEA").await.unwrap().unwrap();
        assert_eq!(stored.quantity, 7);
        assert_eq!(stored.version, 1);

        let missing = generate_product_id();
        assert!(matches!(
            repo.set_quantity(&missing, 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_negative_stock_refused_by_schema() {
        let repo = repo().await;
        let tea = product("TEA", "Tea 250g", 10);
        repo.insert(&tea).await.unwrap();

        let err = repo.set_quantity(&tea.product_id, -1).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_compare_and_set() {
        let repo = repo().await;
        let oil = product("OIL", "Oil 1L", 5);
        repo.insert(&oil).await.unwrap();

        assert!(repo.compare_and_set_quantity(&oil.product_id, 4, 0).await.unwrap());
        // stale version loses
        assert!(!repo.compare_and_set_quantity(&oil.product_id, 3, 0).await.unwrap());

        let stored = repo.get_by_code("OIL").await.unwrap().unwrap();
        assert_eq!(stored.quantity, 4);
        assert_eq!(stored.version, 1);
    }
}
