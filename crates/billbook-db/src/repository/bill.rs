//! # Bill Repository
//!
//! The ledger: immutable bills and their line items.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert(bill)                                                           │
//! │     BEGIN                                                               │
//! │       INSERT INTO bills       (header, storage id = UUID v4)           │
//! │       INSERT INTO bill_items  (one row per item, with position)        │
//! │     COMMIT                    ← all or nothing: a bill is one record   │
//! │                                                                         │
//! │  There is no UPDATE and no DELETE. A return is a new bill.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billbook_core::{Bill, BillItem, Money, PaymentMethod, PersistedBill, ProductCode, TaxRate};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

const BILL_COLUMNS: &str = r#"
    id,
    bill_id,
    date,
    subtotal_minor,
    tax_minor,
    total_minor,
    tax_rate_bps,
    customer_name,
    customer_phone,
    payment_method,
    is_return,
    original_bill_id
"#;

const ITEM_COLUMNS: &str = r#"
    bill_row_id,
    product_code,
    product_name,
    quantity,
    price_minor,
    total_price_minor
"#;

#[derive(Debug, sqlx::FromRow)]
struct BillRow {
    id: String,
    bill_id: String,
    date: DateTime<Utc>,
    subtotal_minor: i64,
    tax_minor: i64,
    total_minor: i64,
    tax_rate_bps: i64,
    customer_name: String,
    customer_phone: Option<String>,
    payment_method: PaymentMethod,
    is_return: bool,
    original_bill_id: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct BillItemRow {
    bill_row_id: String,
    product_code: String,
    product_name: String,
    quantity: i64,
    price_minor: i64,
    total_price_minor: i64,
}

impl TryFrom<BillItemRow> for BillItem {
    type Error = DbError;

    fn try_from(row: BillItemRow) -> Result<Self, Self::Error> {
        Ok(BillItem {
            product_code: ProductCode::parse(&row.product_code)
                .map_err(|e| DbError::corrupt("BillItem", e))?,
            product_name: row.product_name,
            quantity: row.quantity,
            price: Money::from_minor(row.price_minor),
            total_price: Money::from_minor(row.total_price_minor),
        })
    }
}

impl BillRow {
    fn into_persisted(self, items: Vec<BillItem>) -> DbResult<PersistedBill> {
        let tax_rate_bps =
            u32::try_from(self.tax_rate_bps).map_err(|e| DbError::corrupt("Bill", e))?;

        Ok(PersistedBill {
            id: self.id,
            bill: Bill {
                bill_id: self.bill_id,
                date: self.date,
                items,
                subtotal: Money::from_minor(self.subtotal_minor),
                tax: Money::from_minor(self.tax_minor),
                total: Money::from_minor(self.total_minor),
                tax_rate: TaxRate::from_bps(tax_rate_bps),
                customer_name: self.customer_name,
                customer_phone: self.customer_phone,
                payment_method: self.payment_method,
                is_return: self.is_return,
                original_bill_id: self.original_bill_id,
            },
        })
    }
}

/// Repository for the bill ledger.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    /// Creates a new BillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    /// Inserts a bill and its items in one transaction.
    ///
    /// ## Returns
    /// * `Ok(PersistedBill)` - The bill with its storage id
    /// * `Err(DbError::UniqueViolation)` - `bill_id` already used
    /// * `Err(_)` - Nothing was written
    pub async fn insert(&self, bill: &Bill) -> DbResult<PersistedBill> {
        debug!(bill_id = %bill.bill_id, items = bill.items.len(), "Inserting bill");

        let id = Uuid::new_v4().to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let header = sqlx::query(
            r#"
            INSERT INTO bills (
                id, bill_id, date,
                subtotal_minor, tax_minor, total_minor, tax_rate_bps,
                customer_name, customer_phone, payment_method,
                is_return, original_bill_id, created_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5, ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12, ?13
            )
            "#,
        )
        .bind(&id)
        .bind(&bill.bill_id)
        .bind(bill.date)
        .bind(bill.subtotal.minor())
        .bind(bill.tax.minor())
        .bind(bill.total.minor())
        .bind(i64::from(bill.tax_rate.bps()))
        .bind(&bill.customer_name)
        .bind(&bill.customer_phone)
        .bind(bill.payment_method)
        .bind(bill.is_return)
        .bind(&bill.original_bill_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await;

        if let Err(err) = header {
            return Err(match DbError::from(err) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &bill.bill_id),
                other => other,
            });
        }

        for (position, item) in bill.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO bill_items (
                    bill_row_id, position, product_code, product_name,
                    quantity, price_minor, total_price_minor
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&id)
            .bind(position as i64)
            .bind(item.product_code.as_str())
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.price.minor())
            .bind(item.total_price.minor())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(PersistedBill {
            id,
            bill: bill.clone(),
        })
    }

    /// All bills, newest first.
    pub async fn list_ordered_by_date_desc(&self) -> DbResult<Vec<PersistedBill>> {
        let headers = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills ORDER BY date DESC, bill_id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, BillItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM bill_items ORDER BY bill_row_id, position"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = headers.len(), "Listed bills");
        assemble(headers, items)
    }

    /// Looks a bill up by its human-facing bill id.
    pub async fn get_by_bill_id(&self, bill_id: &str) -> DbResult<Option<PersistedBill>> {
        let header = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE bill_id = ?1"
        ))
        .bind(bill_id.trim())
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, BillItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM bill_items WHERE bill_row_id = ?1 ORDER BY position"
        ))
        .bind(&header.id)
        .fetch_all(&self.pool)
        .await?;

        let items = items
            .into_iter()
            .map(BillItem::try_from)
            .collect::<DbResult<Vec<_>>>()?;
        header.into_persisted(items).map(Some)
    }

    /// Return bills recorded against `original_bill_id`, oldest first.
    pub async fn list_returns_for(&self, original_bill_id: &str) -> DbResult<Vec<PersistedBill>> {
        let headers = sqlx::query_as::<_, BillRow>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills \
             WHERE is_return = 1 AND original_bill_id = ?1 \
             ORDER BY date, bill_id"
        ))
        .bind(original_bill_id)
        .fetch_all(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, BillItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM bill_items \
             WHERE bill_row_id IN (SELECT id FROM bills WHERE original_bill_id = ?1) \
             ORDER BY bill_row_id, position"
        ))
        .bind(original_bill_id)
        .fetch_all(&self.pool)
        .await?;

        assemble(headers, items)
    }

    /// Counts stored bills (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bills")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Joins item rows onto their headers, keeping header order.
fn assemble(headers: Vec<BillRow>, items: Vec<BillItemRow>) -> DbResult<Vec<PersistedBill>> {
    let mut by_bill: HashMap<String, Vec<BillItem>> = HashMap::new();
    for row in items {
        let key = row.bill_row_id.clone();
        by_bill.entry(key).or_default().push(BillItem::try_from(row)?);
    }

    headers
        .into_iter()
        .map(|header| {
            let items = by_bill.remove(&header.id).unwrap_or_default();
            header.into_persisted(items)
        })
        .collect()
}
