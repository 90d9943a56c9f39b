//! # Cart Aggregator
//!
//! The in-progress, uncommitted collection of line items for one session.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  scan / select ──► add_by_code / add_by_product                        │
//! │                        │                                                │
//! │                        ├── not in catalog      → ProductNotFound       │
//! │                        ├── new line, stock < 1 → OutOfStock            │
//! │                        ├── existing, +1 > stock→ InsufficientStock     │
//! │                        └── ok: insert qty 1 or increment by 1          │
//! │                                                                         │
//! │  adjust_quantity(±n) ── floor 1, ceiling = snapshot stock              │
//! │  remove_line          ── always succeeds                               │
//! │  totals()             ── recomputed on every call                      │
//! │                                                                         │
//! │  checkout (engine) ──► shortfalls(fresh snapshot) ──► to_bill_items    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed operation never mutates the cart. The cart is keyed by
//! [`ProductCode`], so there is at most one line per product; insertion order
//! is kept separately for display.

use std::collections::HashMap;

use crate::catalog::CatalogSnapshot;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::pricing::compute_totals;
use crate::types::{BillItem, LineItem, Product, ProductCode, ScanError, StockAdjustment, TaxRate, Totals};
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY};

/// A session's cart.
#[derive(Debug, Clone)]
pub struct Cart {
    lines: HashMap<ProductCode, LineItem>,
    order: Vec<ProductCode>,
    tax_rate: TaxRate,
}

impl Cart {
    /// Creates an empty cart priced at `tax_rate`.
    pub fn new(tax_rate: TaxRate) -> Self {
        Cart {
            lines: HashMap::new(),
            order: Vec::new(),
            tax_rate,
        }
    }

    // =========================================================================
    // Adding
    // =========================================================================

    /// Adds one unit of the product scanned or typed as `code`.
    ///
    /// ```rust
    /// use billbook_core::{Cart, CatalogSnapshot, CoreError, TaxRate};
    ///
    /// let mut cart = Cart::new(TaxRate::from_bps(1800));
    /// let snapshot = CatalogSnapshot::empty();
    /// let err = cart.add_by_code(&snapshot, "8901234").unwrap_err();
    /// assert!(matches!(err, CoreError::ProductNotFound(_)));
    /// assert!(cart.is_empty());
    /// ```
    pub fn add_by_code(&mut self, snapshot: &CatalogSnapshot, code: &str) -> CoreResult<&LineItem> {
        let code = code.trim();
        let product = snapshot
            .get(code)
            .ok_or_else(|| CoreError::ProductNotFound(code.to_string()))?;
        self.add_by_product(product)
    }

    /// Adds one unit of an already-resolved product (manual selection).
    ///
    /// The product's own `quantity` is the stock ceiling.
    pub fn add_by_product(&mut self, product: &Product) -> CoreResult<&LineItem> {
        let code = product.product_code.clone();

        if let Some(current) = self.lines.get(&code).map(|l| l.quantity) {
            let requested = current + 1;
            check_ceiling(product, requested)?;
            let line = self
                .lines
                .get_mut(&code)
                .ok_or_else(|| CoreError::ProductNotFound(code.to_string()))?;
            line.quantity = requested;
            return Ok(&*line);
        }

        if product.is_out_of_stock() {
            return Err(CoreError::OutOfStock {
                product_code: code.to_string(),
                product_name: product.name.clone(),
            });
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge { max: MAX_CART_LINES });
        }

        self.order.push(code.clone());
        let line = self
            .lines
            .entry(code)
            .or_insert_with(|| LineItem::from_product(product));
        Ok(&*line)
    }

    /// Feeds the barcode capability's outcome into the cart.
    ///
    /// Capability failures and blank decodes leave the cart untouched.
    pub fn submit_scan(
        &mut self,
        snapshot: &CatalogSnapshot,
        scanned: Result<&str, ScanError>,
    ) -> CoreResult<&LineItem> {
        let raw = scanned?;
        let code = raw.trim();
        if code.is_empty() {
            return Err(CoreError::InvalidCode);
        }
        self.add_by_code(snapshot, code)
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Moves a line's quantity by `delta` and returns the new quantity.
    ///
    /// The result is floored at 1. Increases are capped by the snapshot's
    /// stock for the product; decreases always succeed.
    pub fn adjust_quantity(
        &mut self,
        snapshot: &CatalogSnapshot,
        code: &str,
        delta: i64,
    ) -> CoreResult<i64> {
        let code = code.trim();
        let current = self
            .lines
            .get(code)
            .map(|l| l.quantity)
            .ok_or_else(|| CoreError::ProductNotFound(code.to_string()))?;

        let requested = current.saturating_add(delta).max(1);

        if requested > current {
            let product = snapshot
                .get(code)
                .ok_or_else(|| CoreError::ProductNotFound(code.to_string()))?;
            check_ceiling(product, requested)?;
        }

        if let Some(line) = self.lines.get_mut(code) {
            line.quantity = requested;
        }
        Ok(requested)
    }

    /// Removes a line. Absent codes are a no-op.
    pub fn remove_line(&mut self, code: &str) -> Option<LineItem> {
        let code = code.trim();
        let removed = self.lines.remove(code)?;
        self.order.retain(|c| c.as_str() != code);
        Some(removed)
    }

    /// Empties the cart (after a committed checkout).
    pub fn clear(&mut self) {
        self.lines.clear();
        self.order.clear();
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Lines in the order they were first added.
    pub fn items(&self) -> impl Iterator<Item = &LineItem> + '_ {
        self.order.iter().filter_map(|code| self.lines.get(code))
    }

    pub fn line(&self, code: &str) -> Option<&LineItem> {
        self.lines.get(code.trim())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.values().map(|l| l.quantity).sum()
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// Subtotal, tax and total for the current lines. Never cached.
    pub fn totals(&self) -> Totals {
        compute_totals(self.items(), self.tax_rate)
    }

    /// Lines the given snapshot can no longer satisfy: the product vanished
    /// or its stock dropped below the line's quantity.
    pub fn shortfalls(&self, snapshot: &CatalogSnapshot) -> Vec<&LineItem> {
        self.items()
            .filter(|line| match snapshot.get(line.product_code.as_str()) {
                Some(product) => !product.can_sell(line.quantity),
                None => true,
            })
            .collect()
    }

    /// Frozen bill lines, in display order.
    pub fn to_bill_items(&self) -> Vec<BillItem> {
        self.items().map(BillItem::from).collect()
    }

    /// One stock decrement per line, in display order.
    pub fn sale_adjustments(&self) -> Vec<StockAdjustment> {
        self.items()
            .map(|line| StockAdjustment::sale(line.product_code.clone(), line.quantity))
            .collect()
    }
}

fn check_ceiling(product: &Product, requested: i64) -> CoreResult<()> {
    if !product.can_sell(requested) {
        return Err(CoreError::InsufficientStock {
            product_code: product.product_code.to_string(),
            product_name: product.name.clone(),
            available: product.quantity,
            requested,
        });
    }

    if requested > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        }
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::test_support::product;
    use chrono::Utc;

    fn snapshot(products: Vec<Product>) -> CatalogSnapshot {
        CatalogSnapshot::from_products(products, Utc::now())
    }

    fn rate() -> TaxRate {
        TaxRate::from_bps(1800)
    }

    #[test]
    fn test_repeat_add_merges_into_one_line() {
        let snap = snapshot(vec![product("A", "Apple", 1000, 5)]);
        let mut cart = Cart::new(rate());

        cart.add_by_code(&snap, "A").unwrap();
        cart.add_by_code(&snap, "A").unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line("A").unwrap().quantity, 2);
        assert_eq!(cart.line("A").unwrap().line_total(), Money::from_minor(2000));
    }

    #[test]
    fn test_unknown_code_is_not_found() {
        let snap = snapshot(vec![product("A", "Apple", 1000, 5)]);
        let mut cart = Cart::new(rate());

        let err = cart.add_by_code(&snap, "ZZZ").unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(code) if code == "ZZZ"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_out_of_stock_product_cannot_be_added() {
        let snap = snapshot(vec![product("B", "Bread", 500, 0)]);
        let mut cart = Cart::new(rate());

        let err = cart.add_by_code(&snap, "B").unwrap_err();
        assert!(matches!(err, CoreError::OutOfStock { .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_increment_stops_at_stock() {
        let snap = snapshot(vec![product("A", "Apple", 1000, 2)]);
        let mut cart = Cart::new(rate());

        cart.add_by_code(&snap, "A").unwrap();
        cart.add_by_code(&snap, "A").unwrap();
        let err = cart.add_by_code(&snap, "A").unwrap_err();

        match err {
            CoreError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(cart.line("A").unwrap().quantity, 2);
    }

    #[test]
    fn test_add_by_product_uses_product_stock() {
        let apple = product("A", "Apple", 1000, 1);
        let mut cart = Cart::new(rate());

        cart.add_by_product(&apple).unwrap();
        assert!(cart.add_by_product(&apple).is_err());
        assert_eq!(cart.total_quantity(), 1);
    }

    #[test]
    fn test_price_is_frozen_at_add_time() {
        let mut apple = product("A", "Apple", 1000, 5);
        let mut cart = Cart::new(rate());
        cart.add_by_product(&apple).unwrap();

        apple.selling_price = Money::from_minor(9999);
        cart.add_by_product(&apple).unwrap();

        assert_eq!(cart.line("A").unwrap().unit_price, Money::from_minor(1000));
    }

    #[test]
    fn test_adjust_quantity_floor_and_ceiling() {
        let snap = snapshot(vec![product("A", "Apple", 1000, 4)]);
        let mut cart = Cart::new(rate());
        cart.add_by_code(&snap, "A").unwrap();

        assert_eq!(cart.adjust_quantity(&snap, "A", 3).unwrap(), 4);
        assert!(matches!(
            cart.adjust_quantity(&snap, "A", 1),
            Err(CoreError::InsufficientStock { .. })
        ));
        assert_eq!(cart.line("A").unwrap().quantity, 4);

        assert_eq!(cart.adjust_quantity(&snap, "A", -10).unwrap(), 1);
    }

    #[test]
    fn test_decrease_allowed_when_stock_dropped() {
        let mut cart = Cart::new(rate());
        cart.add_by_code(&snapshot(vec![product("A", "Apple", 1000, 5)]), "A")
            .unwrap();
        cart.adjust_quantity(&snapshot(vec![product("A", "Apple", 1000, 5)]), "A", 4)
            .unwrap();

        let drained = snapshot(vec![product("A", "Apple", 1000, 1)]);
        assert_eq!(cart.adjust_quantity(&drained, "A", -1).unwrap(), 4);
    }

    #[test]
    fn test_adjust_unknown_line_is_not_found() {
        let snap = snapshot(vec![product("A", "Apple", 1000, 4)]);
        let mut cart = Cart::new(rate());
        assert!(matches!(
            cart.adjust_quantity(&snap, "A", 1),
            Err(CoreError::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_remove_line_is_idempotent() {
        let snap = snapshot(vec![product("A", "Apple", 1000, 4), product("B", "Bread", 500, 4)]);
        let mut cart = Cart::new(rate());
        cart.add_by_code(&snap, "A").unwrap();
        cart.add_by_code(&snap, "B").unwrap();

        assert!(cart.remove_line("A").is_some());
        assert!(cart.remove_line("A").is_none());
        let codes: Vec<&str> = cart.items().map(|l| l.product_code.as_str()).collect();
        assert_eq!(codes, vec!["B"]);
    }

    #[test]
    fn test_items_keep_insertion_order() {
        let snap = snapshot(vec![
            product("C", "Curd", 100, 4),
            product("A", "Apple", 100, 4),
            product("B", "Bread", 100, 4),
        ]);
        let mut cart = Cart::new(rate());
        for code in ["B", "C", "A", "B"] {
            cart.add_by_code(&snap, code).unwrap();
        }
        let codes: Vec<&str> = cart.items().map(|l| l.product_code.as_str()).collect();
        assert_eq!(codes, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_totals_follow_every_mutation() {
        let snap = snapshot(vec![product("A", "Apple", 1000, 5), product("B", "Bread", 500, 5)]);
        let mut cart = Cart::new(rate());

        cart.add_by_code(&snap, "A").unwrap();
        cart.add_by_code(&snap, "A").unwrap();
        cart.add_by_code(&snap, "B").unwrap();
        let totals = cart.totals();
        assert_eq!(totals.subtotal, Money::from_minor(2500));
        assert_eq!(totals.tax, Money::from_minor(450));
        assert_eq!(totals.total, Money::from_minor(2950));

        cart.remove_line("B");
        assert_eq!(cart.totals().subtotal, Money::from_minor(2000));
    }

    #[test]
    fn test_submit_scan() {
        let snap = snapshot(vec![product("8901", "Biscuits", 1000, 5)]);
        let mut cart = Cart::new(rate());

        assert!(matches!(
            cart.submit_scan(&snap, Ok("   ")),
            Err(CoreError::InvalidCode)
        ));
        assert!(matches!(
            cart.submit_scan(&snap, Err(ScanError::PermissionDenied)),
            Err(CoreError::Scan(ScanError::PermissionDenied))
        ));
        assert!(cart.is_empty());

        cart.submit_scan(&snap, Ok(" 8901\n")).unwrap();
        assert_eq!(cart.total_quantity(), 1);
    }

    #[test]
    fn test_cart_line_limit() {
        let products: Vec<Product> = (0..=MAX_CART_LINES)
            .map(|i| product(&format!("P{i}"), "Item", 100, 1))
            .collect();
        let snap = snapshot(products);
        let mut cart = Cart::new(rate());

        for i in 0..MAX_CART_LINES {
            cart.add_by_code(&snap, &format!("P{i}")).unwrap();
        }
        let err = cart
            .add_by_code(&snap, &format!("P{MAX_CART_LINES}"))
            .unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { max } if max == MAX_CART_LINES));
    }

    #[test]
    fn test_shortfalls_against_fresh_snapshot() {
        let mut cart = Cart::new(rate());
        let snap = snapshot(vec![product("A", "Apple", 1000, 5), product("B", "Bread", 500, 5)]);
        cart.add_by_code(&snap, "A").unwrap();
        cart.adjust_quantity(&snap, "A", 2).unwrap();
        cart.add_by_code(&snap, "B").unwrap();

        let fresh = snapshot(vec![product("A", "Apple", 1000, 2)]);
        let short: Vec<&str> = cart
            .shortfalls(&fresh)
            .iter()
            .map(|l| l.product_code.as_str())
            .collect();
        assert_eq!(short, vec!["A", "B"]);
        assert!(cart.shortfalls(&snap).is_empty());
    }

    #[test]
    fn test_sale_adjustments_are_negative() {
        let snap = snapshot(vec![product("A", "Apple", 1000, 5)]);
        let mut cart = Cart::new(rate());
        cart.add_by_code(&snap, "A").unwrap();
        cart.add_by_code(&snap, "A").unwrap();

        let adjustments = cart.sale_adjustments();
        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments[0].delta, -2);
    }
}

#[cfg(test)]
mod sequence_tests {
    use super::*;
    use crate::money::Money;
    use crate::test_support::product;
    use chrono::Utc;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Add(&'static str),
        Adjust(&'static str, i64),
        Remove(&'static str),
    }

    fn code() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("A"), Just("B"), Just("C"), Just("Z")]
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => code().prop_map(Op::Add),
            3 => (code(), -4i64..=4).prop_map(|(c, d)| Op::Adjust(c, d)),
            1 => code().prop_map(Op::Remove),
        ]
    }

    fn lines(cart: &Cart) -> Vec<(String, i64)> {
        cart.items()
            .map(|l| (l.product_code.to_string(), l.quantity))
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn cart_stays_within_stock_for_any_sequence(ops in prop::collection::vec(op(), 0..40)) {
            // A: plenty, B: one unit, C: none, Z: not in the catalog
            let snap = CatalogSnapshot::from_products(
                vec![
                    product("A", "Apple", 1000, 3),
                    product("B", "Bread", 450, 1),
                    product("C", "Chana", 999, 0),
                ],
                Utc::now(),
            );
            let mut cart = Cart::new(TaxRate::from_bps(1800));

            for op in ops {
                let before = lines(&cart);
                let failed = match op {
                    Op::Add(c) => cart.add_by_code(&snap, c).is_err(),
                    Op::Adjust(c, d) => cart.adjust_quantity(&snap, c, d).is_err(),
                    Op::Remove(c) => {
                        cart.remove_line(c);
                        false
                    }
                };
                if failed {
                    prop_assert_eq!(&lines(&cart), &before);
                }

                let mut seen = std::collections::HashSet::new();
                for line in cart.items() {
                    prop_assert!(seen.insert(line.product_code.to_string()));
                    let stock = snap.stock_of(line.product_code.as_str()).unwrap_or(0);
                    prop_assert!(line.quantity >= 1);
                    prop_assert!(line.quantity <= stock);
                }
                prop_assert!(cart.line("C").is_none());
                prop_assert!(cart.line("Z").is_none());

                let totals = cart.totals();
                let subtotal = cart
                    .items()
                    .fold(Money::zero(), |sum, l| sum + l.line_total());
                prop_assert_eq!(totals.subtotal, subtotal);
                prop_assert_eq!(totals.total, totals.subtotal + totals.tax);
                prop_assert!(totals.is_consistent());
            }
        }
    }
}
