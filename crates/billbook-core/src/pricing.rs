//! # Pricing Engine
//!
//! Subtotal, tax and grand total from line amounts at a single rate.
//!
//! ```text
//!  subtotal = Σ line_total
//!  tax      = subtotal × rate      (Money::calculate_tax)
//!  total    = subtotal + tax
//! ```
//!
//! Pure and deterministic; recomputed after every cart mutation, never cached.

use crate::money::Money;
use crate::types::{BillItem, LineItem, TaxRate, Totals};

/// Totals for an already-summed subtotal.
pub fn totals_for_subtotal(subtotal: Money, rate: TaxRate) -> Totals {
    let tax = subtotal.calculate_tax(rate);
    Totals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

/// Totals for cart lines.
///
/// ```rust
/// use billbook_core::pricing::compute_totals;
/// use billbook_core::types::TaxRate;
///
/// let totals = compute_totals(&[], TaxRate::from_bps(1800));
/// assert!(totals.total.is_zero());
/// ```
pub fn compute_totals<'a>(
    lines: impl IntoIterator<Item = &'a LineItem>,
    rate: TaxRate,
) -> Totals {
    let subtotal: Money = lines.into_iter().map(LineItem::line_total).sum();
    totals_for_subtotal(subtotal, rate)
}

/// Totals for bill items (sale side).
pub fn compute_bill_totals<'a>(
    items: impl IntoIterator<Item = &'a BillItem>,
    rate: TaxRate,
) -> Totals {
    let subtotal: Money = items.into_iter().map(|i| i.total_price).sum();
    totals_for_subtotal(subtotal, rate)
}

/// Totals for a return bill: every component is `-|x|`, whatever sign the
/// item totals arrived with.
pub fn compute_return_totals<'a>(
    items: impl IntoIterator<Item = &'a BillItem>,
    rate: TaxRate,
) -> Totals {
    let magnitude: Money = items.into_iter().map(|i| i.total_price.abs()).sum();
    let subtotal = magnitude.negated_abs();
    let tax = magnitude.calculate_tax(rate).negated_abs();
    Totals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductCode;

    fn line(code: &str, qty: i64, price: i64) -> LineItem {
        LineItem {
            product_code: ProductCode::parse(code).unwrap(),
            product_name: code.to_string(),
            unit_price: Money::from_minor(price),
            quantity: qty,
        }
    }

    #[test]
    fn test_worked_example_at_eighteen_percent() {
        // [(A, qty=2, price=10), (B, qty=1, price=5)] → 25 / 4.5 / 29.5
        let lines = [line("A", 2, 1000), line("B", 1, 500)];
        let totals = compute_totals(&lines, TaxRate::from_bps(1800));

        assert_eq!(totals.subtotal, Money::from_minor(2500));
        assert_eq!(totals.tax, Money::from_minor(450));
        assert_eq!(totals.total, Money::from_minor(2950));
        assert!(totals.is_consistent());
    }

    #[test]
    fn test_zero_rate() {
        let lines = [line("A", 3, 333)];
        let totals = compute_totals(&lines, TaxRate::zero());
        assert_eq!(totals.tax, Money::zero());
        assert_eq!(totals.total, Money::from_minor(999));
    }

    #[test]
    fn test_return_totals_are_never_positive() {
        let items = [
            BillItem::from(&line("A", 1, 1000)),
            BillItem {
                total_price: Money::from_minor(-500),
                ..BillItem::from(&line("B", 1, 500))
            },
        ];
        let totals = compute_return_totals(&items, TaxRate::from_bps(1800));

        assert_eq!(totals.subtotal, Money::from_minor(-1500));
        assert_eq!(totals.tax, Money::from_minor(-270));
        assert_eq!(totals.total, Money::from_minor(-1770));
        assert!(totals.is_consistent());
    }

    #[test]
    fn test_totals_consistent_across_many_carts() {
        let rate = TaxRate::from_bps(1800);
        for qty in 1..=20 {
            for price in [1, 7, 99, 1001, 12_345] {
                let lines = [line("A", qty, price), line("B", 1, price * 3)];
                assert!(compute_totals(&lines, rate).is_consistent());
            }
        }
    }
}
