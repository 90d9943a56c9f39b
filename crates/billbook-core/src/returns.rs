//! # Return Bills
//!
//! Builds the negated, linked bill that reverses part or all of a sale.
//!
//! ## Return Flow (pure part)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  original Bill ──┐                                                      │
//! │  prior returns ──┼──► build_return ──► Bill {                           │
//! │  selection ──────┘        │              bill_id: "R-" + original,      │
//! │                           │              is_return: true,               │
//! │                           │              original_bill_id: original,    │
//! │                           │              amounts: all <= 0 }            │
//! │                           │                                             │
//! │                           ├── original is a return → InvalidOperation   │
//! │                           ├── nothing selected     → NoItemsSelected    │
//! │                           ├── code not on bill     → ProductNotFound    │
//! │                           └── qty > still-returnable → OutOfRange       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The original bill is never touched. Stock replenishment and persistence
//! happen in `billbook-engine::returns`.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};

use crate::error::{CoreError, CoreResult};
use crate::pricing::compute_return_totals;
use crate::types::{Bill, BillItem, ProductCode};

/// Prefix carried by every return bill id.
pub const RETURN_PREFIX: &str = "R-";

/// Per-product quantities the cashier chose to take back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnSelection {
    quantities: BTreeMap<ProductCode, i64>,
}

impl ReturnSelection {
    pub fn new() -> Self {
        ReturnSelection::default()
    }

    /// A selection listing every product on `bill` at quantity 0.
    pub fn for_bill(bill: &Bill) -> Self {
        let quantities = bill
            .items
            .iter()
            .map(|item| (item.product_code.clone(), 0))
            .collect();
        ReturnSelection { quantities }
    }

    /// Sets a quantity from the return dialog. Only values in `0..=max` are
    /// accepted; anything else is ignored and `false` is returned.
    ///
    /// ```rust
    /// use billbook_core::{ProductCode, ReturnSelection};
    ///
    /// let code = ProductCode::parse("A").unwrap();
    /// let mut selection = ReturnSelection::new();
    /// assert!(selection.set(&code, 2, 2));
    /// assert!(!selection.set(&code, 3, 2));
    /// assert_eq!(selection.quantity_of("A"), 2);
    /// ```
    pub fn set(&mut self, code: &ProductCode, quantity: i64, max: i64) -> bool {
        if !(0..=max).contains(&quantity) {
            return false;
        }
        self.quantities.insert(code.clone(), quantity);
        true
    }

    /// Records a requested quantity without a bound check; `build_return`
    /// rejects out-of-range requests.
    pub fn request(mut self, code: ProductCode, quantity: i64) -> Self {
        self.quantities.insert(code, quantity);
        self
    }

    pub fn quantity_of(&self, code: &str) -> i64 {
        self.quantities.get(code).copied().unwrap_or(0)
    }

    /// True when every requested quantity is zero.
    pub fn is_empty(&self) -> bool {
        self.quantities.values().all(|q| *q == 0)
    }

    /// Non-zero requests.
    pub fn requested(&self) -> impl Iterator<Item = (&ProductCode, i64)> + '_ {
        self.quantities
            .iter()
            .filter(|(_, q)| **q != 0)
            .map(|(code, q)| (code, *q))
    }
}

/// Id for the next return against `original_bill_id`, given how many
/// returns already exist for it.
///
/// ```rust
/// use billbook_core::returns::return_bill_id;
///
/// assert_eq!(return_bill_id("BILL-1-01", 0), "R-BILL-1-01");
/// assert_eq!(return_bill_id("BILL-1-01", 1), "R-BILL-1-01-2");
/// ```
pub fn return_bill_id(original_bill_id: &str, prior_returns: usize) -> String {
    if prior_returns == 0 {
        format!("{}{}", RETURN_PREFIX, original_bill_id)
    } else {
        format!("{}{}-{}", RETURN_PREFIX, original_bill_id, prior_returns + 1)
    }
}

/// Quantity of `code` still returnable after `prior_returns`.
pub fn returnable_quantity(original: &Bill, prior_returns: &[Bill], code: &str) -> i64 {
    let returned: i64 = linked_returns(original, prior_returns)
        .map(|r| r.quantity_of(code))
        .sum();
    (original.quantity_of(code) - returned).max(0)
}

fn linked_returns<'a>(original: &'a Bill, prior_returns: &'a [Bill]) -> impl Iterator<Item = &'a Bill> {
    prior_returns
        .iter()
        .filter(move |r| r.is_return && r.original_bill_id.as_deref() == Some(original.bill_id.as_str()))
}

/// Builds the return bill for `selection` against `original`.
///
/// Tax is computed at the original bill's recorded rate; customer and
/// payment details are copied across.
pub fn build_return(
    original: &Bill,
    selection: &ReturnSelection,
    prior_returns: &[Bill],
    date: DateTime<Utc>,
) -> CoreResult<Bill> {
    if original.is_return {
        return Err(CoreError::InvalidOperation(
            "Cannot return items from a return bill".to_string(),
        ));
    }

    if selection.is_empty() {
        return Err(CoreError::NoItemsSelected);
    }

    for (code, requested) in selection.requested() {
        if original.quantity_of(code.as_str()) == 0 {
            return Err(CoreError::ProductNotFound(code.to_string()));
        }
        let max = returnable_quantity(original, prior_returns, code.as_str());
        if requested < 0 || requested > max {
            return Err(CoreError::ReturnQuantityOutOfRange {
                product_code: code.to_string(),
                requested,
                max,
            });
        }
    }

    let mut seen = HashSet::new();
    let items: Vec<BillItem> = original
        .items
        .iter()
        .filter(|item| seen.insert(item.product_code.clone()))
        .filter_map(|item| {
            let quantity = selection.quantity_of(item.product_code.as_str());
            (quantity > 0).then(|| BillItem {
                product_code: item.product_code.clone(),
                product_name: item.product_name.clone(),
                quantity,
                price: item.price,
                total_price: item.price.multiply_quantity(quantity).negated_abs(),
            })
        })
        .collect();

    let totals = compute_return_totals(&items, original.tax_rate);
    let prior_count = linked_returns(original, prior_returns).count();

    Ok(Bill {
        bill_id: return_bill_id(&original.bill_id, prior_count),
        date,
        items,
        subtotal: totals.subtotal,
        tax: totals.tax,
        total: totals.total,
        tax_rate: original.tax_rate,
        customer_name: original.customer_name.clone(),
        customer_phone: original.customer_phone.clone(),
        payment_method: original.payment_method,
        is_return: true,
        original_bill_id: Some(original.bill_id.clone()),
    })
}
