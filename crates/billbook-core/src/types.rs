//! # Domain Types
//!
//! Core domain types used throughout Billbook POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Bill       │   │    BillItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id     │   │  bill_id        │   │  product_code   │       │
//! │  │  product_code   │   │  date           │   │  product_name   │       │
//! │  │  selling_price  │   │  items ─────────┼──►│  quantity       │       │
//! │  │  quantity       │   │  subtotal/tax/  │   │  price          │       │
//! │  │  version        │   │  total          │   │  total_price    │       │
//! │  └─────────────────┘   │  is_return      │   └─────────────────┘       │
//! │                        │  original_bill  │                              │
//! │  ┌─────────────────┐   └─────────────────┘   ┌─────────────────┐       │
//! │  │    TaxRate      │                         │ StockAdjustment │       │
//! │  │  bps (u32)      │                         │  product_code   │       │
//! │  │  1800 = 18%     │                         │  delta (signed) │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! - `product_id` / `PersistedBill::id`: storage key (UUID v4)
//! - `product_code` / `bill_id`: business key, scan-matchable or printed
//!
//! ## Document Schema
//! Serde field names are camelCase so exported JSON keeps the established
//! document layout (`billId`, `customerName`, `isReturn`, `originalBillId`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::validate_product_code;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1800 bps = 18% GST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for config parsing).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Printable tax label, e.g. `"GST (18%)"`.
    ///
    /// Receipts must take their label from the same rate that produced the
    /// bill's tax amount, never from a hard-coded string.
    pub fn label(&self, tax_name: &str) -> String {
        format!("{} ({})", tax_name, self)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

/// `1800` → `18%`, `825` → `8.25%`, `250` → `2.5%`.
impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{}%", whole)
        } else if frac % 10 == 0 {
            write!(f, "{}.{}%", whole, frac / 10)
        } else {
            write!(f, "{}.{:02}%", whole, frac)
        }
    }
}

// =============================================================================
// Product Code
// =============================================================================

/// Scan-matchable product identifier.
///
/// Always trimmed and validated; a cart is keyed by this type, so two lines
/// for the same product cannot exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductCode(String);

impl ProductCode {
    /// Parses and validates a raw code (scanner output, form input).
    ///
    /// ```rust
    /// use billbook_core::types::ProductCode;
    ///
    /// let code = ProductCode::parse("  8901234567890 ").unwrap();
    /// assert_eq!(code.as_str(), "8901234567890");
    /// assert!(ProductCode::parse("").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        validate_product_code(trimmed)?;
        Ok(ProductCode(trimmed.to_string()))
    }

    /// Returns the code as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProductCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductCode::parse(s)
    }
}

impl TryFrom<String> for ProductCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ProductCode::parse(&value)
    }
}

impl From<ProductCode> for String {
    fn from(code: ProductCode) -> Self {
        code.0
    }
}

impl AsRef<str> for ProductCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ProductCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Product
// =============================================================================

/// Product category as maintained by the (external) taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub subcategories: Vec<String>,
}

/// A product in the catalog.
///
/// `quantity` is only ever written by the stock reconciler (or catalog
/// edits made outside this core) and is never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Storage key (UUID v4).
    pub product_id: String,

    /// Business identifier matched by the scanner.
    #[ts(type = "string")]
    pub product_code: ProductCode,

    /// Display name shown to cashier and printed on the bill.
    pub name: String,

    pub selling_price: Money,
    pub cost_price: Money,
    pub mrp: Money,

    pub category: Category,

    /// Units in stock.
    pub quantity: i64,

    pub dealer_name: Option<String>,

    /// Bumped on every stock write; compared by optimistic stock updates.
    pub version: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether `quantity` units can be sold from current stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity <= self.quantity
    }

    /// Checks if the product has no stock at all.
    #[inline]
    pub fn is_out_of_stock(&self) -> bool {
        self.quantity < 1
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Upi,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "upi" => Ok(PaymentMethod::Upi),
            _ => Err(ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: vec!["cash".to_string(), "card".to_string(), "upi".to_string()],
            }),
        }
    }
}

// =============================================================================
// Line Item (cart)
// =============================================================================

/// One product's entry in an in-progress cart.
///
/// ## Snapshot Pattern
/// `product_name` and `unit_price` are frozen when the product is first
/// added; later catalog edits do not reach the cart or the bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[ts(type = "string")]
    pub product_code: ProductCode,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: i64,
}

impl LineItem {
    /// Creates a line with quantity 1, freezing name and price.
    pub fn from_product(product: &Product) -> Self {
        LineItem {
            product_code: product.product_code.clone(),
            product_name: product.name.clone(),
            unit_price: product.selling_price,
            quantity: 1,
        }
    }

    /// `quantity × unit_price`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Bill
// =============================================================================

/// A finalized line on a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BillItem {
    #[ts(type = "string")]
    pub product_code: ProductCode,
    pub product_name: String,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub price: Money,
    /// `quantity × price`; negative on return bills.
    pub total_price: Money,
}

impl From<&LineItem> for BillItem {
    fn from(line: &LineItem) -> Self {
        BillItem {
            product_code: line.product_code.clone(),
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            price: line.unit_price,
            total_price: line.line_total(),
        }
    }
}

/// Subtotal / tax / total triple produced by the pricing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl Totals {
    /// `total == subtotal + tax`.
    #[inline]
    pub fn is_consistent(&self) -> bool {
        self.subtotal + self.tax == self.total
    }
}

/// An immutable record of a completed sale or return.
///
/// Bills are never edited after creation. Reversal is modelled as a new
/// bill with `is_return = true` pointing back through `original_bill_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    /// Human-facing bill number, e.g. `BILL-1760512345678-01` or `R-BILL-…`.
    pub bill_id: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub items: Vec<BillItem>,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    /// Rate that produced `tax`, recorded for audit and for returns.
    pub tax_rate: TaxRate,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub is_return: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_bill_id: Option<String>,
}

impl Bill {
    /// Returns the totals triple.
    pub fn totals(&self) -> Totals {
        Totals {
            subtotal: self.subtotal,
            tax: self.tax,
            total: self.total,
        }
    }

    /// Total units across all items.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Quantity of `code` on this bill (0 if absent).
    pub fn quantity_of(&self, code: &str) -> i64 {
        self.items
            .iter()
            .filter(|i| i.product_code.as_str() == code)
            .map(|i| i.quantity)
            .sum()
    }

    /// Checks the bill's internal invariants.
    ///
    /// - `total == subtotal + tax`
    /// - `subtotal == Σ total_price`
    /// - `tax` is the recorded rate applied to `subtotal`
    /// - on a return, every amount is `<= 0` and `original_bill_id` is set
    pub fn is_consistent(&self) -> bool {
        let items_sum: Money = self.items.iter().map(|i| i.total_price).sum();
        let base = self.totals().is_consistent()
            && items_sum == self.subtotal
            && self.subtotal.calculate_tax(self.tax_rate) == self.tax;

        if !self.is_return {
            return base && self.original_bill_id.is_none();
        }

        base && self.original_bill_id.is_some()
            && !self.subtotal.is_positive()
            && !self.tax.is_positive()
            && !self.total.is_positive()
            && self.items.iter().all(|i| !i.total_price.is_positive())
    }
}

/// A bill as stored: the bill plus its storage-assigned identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedBill {
    pub id: String,
    #[serde(flatten)]
    pub bill: Bill,
}

// =============================================================================
// Stock Adjustment
// =============================================================================

/// Intent to move a product's stock by `delta`. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub product_code: ProductCode,
    pub delta: i64,
}

impl StockAdjustment {
    /// Stock leaving the shop (`delta = -quantity`).
    pub fn sale(product_code: ProductCode, quantity: i64) -> Self {
        StockAdjustment {
            product_code,
            delta: -quantity,
        }
    }

    /// Stock coming back on a return (`delta = +quantity`).
    pub fn restock(product_code: ProductCode, quantity: i64) -> Self {
        StockAdjustment {
            product_code,
            delta: quantity,
        }
    }

    /// `max(0, current + delta)`: stock never goes negative, even when
    /// cart validation was bypassed.
    #[inline]
    pub fn apply_to(&self, current: i64) -> i64 {
        (current + self.delta).max(0)
    }
}

// =============================================================================
// Barcode capability
// =============================================================================

/// Failures reported by the barcode capability before any code is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ScanError {
    #[error("Camera permission was denied")]
    PermissionDenied,
    #[error("No camera found")]
    DeviceNotFound,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bill_with(items: Vec<BillItem>, subtotal: i64, tax: i64, total: i64) -> Bill {
        Bill {
            bill_id: "BILL-1".to_string(),
            date: Utc::now(),
            items,
            subtotal: Money::from_minor(subtotal),
            tax: Money::from_minor(tax),
            total: Money::from_minor(total),
            tax_rate: TaxRate::from_bps(1800),
            customer_name: "Walk-in".to_string(),
            customer_phone: None,
            payment_method: PaymentMethod::Cash,
            is_return: false,
            original_bill_id: None,
        }
    }

    fn item(code: &str, qty: i64, price: i64) -> BillItem {
        BillItem {
            product_code: ProductCode::parse(code).unwrap(),
            product_name: format!("Product {}", code),
            quantity: qty,
            price: Money::from_minor(price),
            total_price: Money::from_minor(price * qty),
        }
    }

    #[test]
    fn test_tax_rate_display_and_label() {
        assert_eq!(TaxRate::from_bps(1800).to_string(), "18%");
        assert_eq!(TaxRate::from_bps(500).to_string(), "5%");
        assert_eq!(TaxRate::from_bps(825).to_string(), "8.25%");
        assert_eq!(TaxRate::from_bps(250).to_string(), "2.5%");
        assert_eq!(TaxRate::from_bps(1800).label("GST"), "GST (18%)");
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(18.0).bps(), 1800);
        assert_eq!(TaxRate::from_percentage(8.25).bps(), 825);
    }

    #[test]
    fn test_product_code_is_trimmed_and_validated() {
        let code: ProductCode = " ABC-1 ".parse().unwrap();
        assert_eq!(code.as_str(), "ABC-1");
        assert!(ProductCode::parse("   ").is_err());
        assert!(ProductCode::parse("has space").is_err());
    }

    #[test]
    fn test_product_code_json_is_plain_string() {
        let code = ProductCode::parse("8901").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"8901\"");
        let back: ProductCode = serde_json::from_str("\"8901\"").unwrap();
        assert_eq!(back, code);
        assert!(serde_json::from_str::<ProductCode>("\"\"").is_err());
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("UPI".parse::<PaymentMethod>().unwrap(), PaymentMethod::Upi);
        assert_eq!("card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_stock_adjustment_never_goes_negative() {
        let code = ProductCode::parse("A").unwrap();
        assert_eq!(StockAdjustment::sale(code.clone(), 2).apply_to(5), 3);
        assert_eq!(StockAdjustment::sale(code.clone(), 9).apply_to(5), 0);
        assert_eq!(StockAdjustment::restock(code, 1).apply_to(0), 1);
    }

    #[test]
    fn test_bill_consistency() {
        let bill = bill_with(vec![item("A", 2, 1000), item("B", 1, 500)], 2500, 450, 2950);
        assert!(bill.is_consistent());
        assert_eq!(bill.quantity_of("A"), 2);
        assert_eq!(bill.total_quantity(), 3);

        let broken = bill_with(vec![item("A", 2, 1000)], 2000, 360, 2300);
        assert!(!broken.is_consistent());
    }

    #[test]
    fn test_bill_json_uses_document_field_names() {
        let bill = bill_with(vec![item("A", 1, 1000)], 1000, 180, 1180);
        let json = serde_json::to_value(&bill).unwrap();
        assert!(json.get("billId").is_some());
        assert!(json.get("customerName").is_some());
        assert!(json.get("paymentMethod").is_some());
        assert_eq!(json["isReturn"], serde_json::json!(false));
        assert!(json.get("originalBillId").is_none());
        assert_eq!(json["items"][0]["totalPrice"], serde_json::json!(1000));
    }
}
