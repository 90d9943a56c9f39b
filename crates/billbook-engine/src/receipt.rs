//! # Receipt View
//!
//! Read-only projection of a persisted bill for printing or export.
//!
//! ```text
//!   PersistedBill ─┐
//!   BusinessProfile├──► ReceiptView ──► render_text() / JSON / TS binding
//!   tax name ──────┘
//! ```
//!
//! The tax label is derived from the rate recorded on the bill, so the
//! printed label always matches the printed amount.

use billbook_core::{BillItem, Money, PaymentMethod, PersistedBill};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use ts_rs::TS;

const WALK_IN: &str = "Walk-in Customer";

/// Shop details printed at the top of every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct BusinessProfile {
    pub name: String,
    pub address: String,
    pub gstin: Option<String>,
    pub phone: Option<String>,
}

impl Default for BusinessProfile {
    fn default() -> Self {
        BusinessProfile {
            name: "Billbook Store".to_string(),
            address: String::new(),
            gstin: None,
            phone: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub product_name: String,
    pub quantity: i64,
    pub price: Money,
    pub total_price: Money,
}

impl From<&BillItem> for ReceiptLine {
    fn from(item: &BillItem) -> Self {
        ReceiptLine {
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            price: item.price,
            total_price: item.total_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptView {
    pub business: BusinessProfile,
    pub bill_id: String,
    /// RFC 3339 timestamp.
    pub date: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub payment_method: PaymentMethod,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: Money,
    /// e.g. `"GST (18%)"`.
    pub tax_label: String,
    pub tax: Money,
    pub total: Money,
    pub is_return: bool,
    pub original_bill_id: Option<String>,
}

impl ReceiptView {
    pub fn new(persisted: &PersistedBill, business: &BusinessProfile, tax_name: &str) -> Self {
        let bill = &persisted.bill;
        ReceiptView {
            business: business.clone(),
            bill_id: bill.bill_id.clone(),
            date: bill.date.to_rfc3339(),
            customer_name: if bill.customer_name.is_empty() {
                WALK_IN.to_string()
            } else {
                bill.customer_name.clone()
            },
            customer_phone: bill.customer_phone.clone(),
            payment_method: bill.payment_method,
            lines: bill.items.iter().map(ReceiptLine::from).collect(),
            subtotal: bill.subtotal,
            tax_label: bill.tax_rate.label(tax_name),
            tax: bill.tax,
            total: bill.total,
            is_return: bill.is_return,
            original_bill_id: bill.original_bill_id.clone(),
        }
    }

    /// Plain-text receipt for a 48-column printer or a terminal.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rule = "-".repeat(48);

        // Writing into a String cannot fail
        let _ = writeln!(out, "{:^48}", self.business.name);
        if !self.business.address.is_empty() {
            let _ = writeln!(out, "{:^48}", self.business.address);
        }
        if let Some(phone) = &self.business.phone {
            let _ = writeln!(out, "{:^48}", format!("Ph: {}", phone));
        }
        if let Some(gstin) = &self.business.gstin {
            let _ = writeln!(out, "{:^48}", format!("GSTIN: {}", gstin));
        }
        let _ = writeln!(out, "{}", rule);

        let title = if self.is_return { "RETURN" } else { "BILL" };
        let _ = writeln!(out, "{}: {}", title, self.bill_id);
        if let Some(original) = &self.original_bill_id {
            let _ = writeln!(out, "Against: {}", original);
        }
        let _ = writeln!(out, "Date: {}", self.date);
        let _ = writeln!(out, "Customer: {}", self.customer_name);
        if let Some(phone) = &self.customer_phone {
            let _ = writeln!(out, "Phone: {}", phone);
        }
        let _ = writeln!(out, "Payment: {}", self.payment_method);
        let _ = writeln!(out, "{}", rule);

        for line in &self.lines {
            let _ = writeln!(
                out,
                "{:<26} {:>4} x {:>6} {:>8}",
                truncate(&line.product_name, 26),
                line.quantity,
                line.price.to_string(),
                line.total_price.to_string()
            );
        }

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "{:<36}{:>12}", "Subtotal", self.subtotal.to_string());
        let _ = writeln!(out, "{:<36}{:>12}", self.tax_label, self.tax.to_string());
        let _ = writeln!(out, "{:<36}{:>12}", "TOTAL", self.total.to_string());
        out
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}
