//! # Register
//!
//! Runs parsed commands against one [`PosSession`] and formats the result.
//!
//! ```text
//!   Command ──► Register::execute ──► Reply::Output(text) / Reply::Quit
//!                      │
//!                      ├── PartialCommit ──► keeps `pending` for `resume`
//!                      └── other errors  ──► RegisterError
//! ```

use billbook_core::{CoreError, ProductCode, ReturnSelection, StockAdjustment};
use billbook_engine::{CheckoutRequest, Engine, EngineError, PosSession};
use std::fmt::Write;
use tracing::{info, warn};

use crate::commands::{Command, HELP};
use crate::error::{ErrorCode, RegisterError};

pub type RegisterResult<T> = Result<T, RegisterError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Output(String),
    Quit,
}

pub struct Register {
    engine: Engine,
    session: PosSession,
    /// Stock adjustments committed checkouts could not apply, oldest
    /// first. Only `resume` removes entries, and only the ones that land.
    pending: Vec<StockAdjustment>,
}

impl Register {
    pub async fn open(engine: Engine) -> RegisterResult<Self> {
        let session = engine.open_session().await?;
        Ok(Register {
            engine,
            session,
            pending: Vec::new(),
        })
    }

    pub fn pending(&self) -> &[StockAdjustment] {
        &self.pending
    }

    pub async fn execute(&mut self, command: Command) -> RegisterResult<Reply> {
        let text = match command {
            Command::Scan(code) => {
                let line = self.session.scan(Ok(code.as_str()))?;
                format!("{} x{}", line.product_name, line.quantity)
            }
            Command::Add(code) => {
                let line = self.session.add(&code)?;
                format!("{} x{}", line.product_name, line.quantity)
            }
            Command::Qty { code, delta } => {
                let quantity = self.session.adjust(&code, delta)?;
                format!("{} now x{}", code, quantity)
            }
            Command::Remove(code) => match self.session.remove(&code) {
                Some(line) => format!("Removed {}", line.product_name),
                None => format!("{} is not in the cart", code),
            },
            Command::Cart => self.render_cart(),
            Command::Products => self.render_products(),
            Command::Refresh => {
                self.session.refresh_catalog().await?;
                format!("Catalog reloaded ({} products)", self.session.snapshot().len())
            }
            Command::Checkout {
                payment_method,
                customer_name,
                customer_phone,
            } => {
                let request = CheckoutRequest {
                    customer_name,
                    customer_phone,
                    payment_method,
                };
                self.checkout(&request).await?
            }
            Command::Resume => self.resume().await?,
            Command::Bills => self.render_bills().await?,
            Command::Show(bill_id) => {
                let bill = self
                    .session
                    .bill(&bill_id)
                    .await?
                    .ok_or_else(|| EngineError::BillNotFound(bill_id.clone()))?;
                self.engine.receipt(&bill).render_text()
            }
            Command::Export(bill_id) => {
                let bill = self
                    .session
                    .bill(&bill_id)
                    .await?
                    .ok_or_else(|| EngineError::BillNotFound(bill_id.clone()))?;
                serde_json::to_string_pretty(&self.engine.receipt(&bill))
                    .map_err(|e| RegisterError::new(ErrorCode::Internal, e.to_string()))?
            }
            Command::Return { bill_id, items } => self.process_return(&bill_id, items).await?,
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Reply::Quit),
        };
        Ok(Reply::Output(text))
    }

    async fn checkout(&mut self, request: &CheckoutRequest) -> RegisterResult<String> {
        match self.session.checkout(request).await {
            Ok(receipt) => Ok(self.engine.receipt(&receipt.bill).render_text()),
            Err(EngineError::PartialCommit(partial)) => {
                warn!(
                    bill_id = %partial.bill.bill.bill_id,
                    pending = partial.pending.len(),
                    "Checkout left stock pending"
                );
                self.pending.extend(partial.pending.iter().cloned());
                let mut message = format!(
                    "Bill {} saved but {} stock update(s) failed ({} pending in total). Type 'resume' to retry.\n",
                    partial.bill.bill.bill_id,
                    partial.failed.len(),
                    self.pending.len()
                );
                message.push_str(&partial.log.to_string());
                Err(RegisterError::new(ErrorCode::Reconcile, message))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn resume(&mut self) -> RegisterResult<String> {
        if self.pending.is_empty() {
            return Ok("No stock updates pending".to_string());
        }

        let retried = std::mem::take(&mut self.pending);
        match self.session.resume_stock(&retried).await {
            Ok(report) => {
                info!(applied = report.applied.len(), "Pending stock applied");
                Ok(format!("{} stock update(s) applied", report.applied.len()))
            }
            Err(e) => {
                // The retried batch shrinks to what failed again.
                self.pending = e.pending();
                Err(RegisterError::new(
                    ErrorCode::Reconcile,
                    format!("{}. Type 'resume' to retry.", e),
                ))
            }
        }
    }

    async fn process_return(
        &mut self,
        bill_id: &str,
        items: Vec<(String, i64)>,
    ) -> RegisterResult<String> {
        let mut selection = ReturnSelection::new();
        for (code, quantity) in items {
            let code = ProductCode::parse(&code).map_err(CoreError::from)?;
            selection = selection.request(code, quantity);
        }

        let outcome = self.session.process_return(bill_id, &selection).await?;
        Ok(self.engine.receipt(&outcome.bill).render_text())
    }

    fn render_cart(&self) -> String {
        let cart = self.session.cart();
        if cart.is_empty() {
            return "Cart is empty".to_string();
        }

        let mut out = String::new();
        for line in cart.items() {
            let _ = writeln!(
                out,
                "{:<14} {:<24} {:>4} x {:>8} {:>10}",
                line.product_code.as_str(),
                line.product_name,
                line.quantity,
                line.unit_price.to_string(),
                line.line_total().to_string()
            );
        }
        let totals = self.session.totals();
        let tax_label = cart.tax_rate().label(&self.engine.config().billing.tax_name);
        let _ = writeln!(out, "{:<54}{:>10}", "Subtotal", totals.subtotal.to_string());
        let _ = writeln!(out, "{:<54}{:>10}", tax_label, totals.tax.to_string());
        let _ = write!(out, "{:<54}{:>10}", "TOTAL", totals.total.to_string());
        out
    }

    fn render_products(&self) -> String {
        let products = self.session.snapshot().products();
        if products.is_empty() {
            return "No products".to_string();
        }

        let mut out = String::new();
        for product in products {
            let stock = if product.is_out_of_stock() {
                "out of stock".to_string()
            } else {
                format!("{} in stock", product.quantity)
            };
            let _ = writeln!(
                out,
                "{:<14} {:<24} {:>10}  {}",
                product.product_code.as_str(),
                product.name,
                product.selling_price.to_string(),
                stock
            );
        }
        out.trim_end().to_string()
    }

    async fn render_bills(&self) -> RegisterResult<String> {
        let bills = self.session.bills().await?;
        if bills.is_empty() {
            return Ok("No bills yet".to_string());
        }

        let mut out = String::new();
        for persisted in bills {
            let bill = &persisted.bill;
            let _ = writeln!(
                out,
                "{:<32} {}  {:>10}  {}",
                bill.bill_id,
                bill.date.format("%Y-%m-%d %H:%M"),
                bill.total.to_string(),
                if bill.is_return { "return" } else { "sale" }
            );
        }
        Ok(out.trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::parse;
    use billbook_core::{Category, Money, Product};
    use billbook_engine::store::{MemoryBillStore, MemoryCatalogStore};
    use billbook_engine::EngineConfig;
    use chrono::Utc;
    use std::sync::Arc;

    const TEA: &str = "8901000000001";
    const SUGAR: &str = "8901000000002";

    fn tea(quantity: i64) -> Product {
        let now = Utc::now();
        Product {
            product_id: "p-tea".to_string(),
            product_code: ProductCode::parse(TEA).unwrap(),
            name: "Tea 250g".to_string(),
            selling_price: Money::from_minor(12000),
            cost_price: Money::from_minor(10000),
            mrp: Money::from_minor(12500),
            category: Category::default(),
            quantity,
            dealer_name: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    async fn register() -> (Register, Arc<MemoryCatalogStore>) {
        let catalog = Arc::new(MemoryCatalogStore::new(vec![tea(4)]));
        let engine = Engine::new(
            catalog.clone(),
            Arc::new(MemoryBillStore::new()),
            EngineConfig::default(),
        );
        (Register::open(engine).await.unwrap(), catalog)
    }

    async fn run(register: &mut Register, line: &str) -> RegisterResult<String> {
        let command = parse(line)?.ok_or_else(|| RegisterError::new(ErrorCode::Input, "blank"))?;
        match register.execute(command).await? {
            Reply::Output(text) => Ok(text),
            Reply::Quit => Ok("quit".to_string()),
        }
    }

    #[tokio::test]
    async fn test_sale_prints_receipt() {
        let (mut register, catalog) = register().await;

        assert_eq!(run(&mut register, &format!("scan {}", TEA)).await.unwrap(), "Tea 250g x1");
        run(&mut register, &format!("qty {} +1", TEA)).await.unwrap();

        let cart = run(&mut register, "cart").await.unwrap();
        assert!(cart.contains("GST (18%)"));
        assert!(cart.contains("283.20"));

        let receipt = run(&mut register, "checkout cash").await.unwrap();
        assert!(receipt.contains("Walk-in Customer"));
        assert!(receipt.contains("283.20"));
        assert_eq!(catalog.quantity_of(TEA).await, Some(2));
        assert_eq!(run(&mut register, "cart").await.unwrap(), "Cart is empty");
    }

    #[tokio::test]
    async fn test_partial_commit_then_resume() {
        let (mut register, catalog) = register().await;
        run(&mut register, &format!("add {}", TEA)).await.unwrap();

        catalog.fail_writes_for(TEA).await;
        let err = run(&mut register, "checkout upi").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Reconcile);
        assert!(err.message.contains("resume"));
        assert_eq!(register.pending().len(), 1);
        assert_eq!(catalog.quantity_of(TEA).await, Some(4));

        catalog.clear_faults().await;
        let out = run(&mut register, "resume").await.unwrap();
        assert_eq!(out, "1 stock update(s) applied");
        assert!(register.pending().is_empty());
        assert_eq!(catalog.quantity_of(TEA).await, Some(3));
    }

    #[tokio::test]
    async fn test_partial_commits_accumulate_until_resumed() {
        let catalog = Arc::new(MemoryCatalogStore::new(vec![
            tea(5),
            Product {
                product_id: "p-sugar".to_string(),
                product_code: ProductCode::parse(SUGAR).unwrap(),
                name: "Sugar 1kg".to_string(),
                ..tea(5)
            },
        ]));
        let engine = Engine::new(
            catalog.clone(),
            Arc::new(MemoryBillStore::new()),
            EngineConfig::default(),
        );
        let mut register = Register::open(engine).await.unwrap();
        catalog.fail_writes_for(TEA).await;
        catalog.fail_writes_for(SUGAR).await;

        run(&mut register, &format!("add {}", TEA)).await.unwrap();
        run(&mut register, "checkout cash").await.unwrap_err();
        run(&mut register, &format!("add {}", SUGAR)).await.unwrap();
        let err = run(&mut register, "checkout cash").await.unwrap_err();
        assert!(err.message.contains("2 pending in total"));

        let codes: Vec<&str> = register
            .pending()
            .iter()
            .map(|a| a.product_code.as_str())
            .collect();
        assert_eq!(codes, vec![TEA, SUGAR]);

        // Sugar recovers first; tea must stay queued.
        catalog.clear_faults().await;
        catalog.fail_writes_for(TEA).await;
        let err = run(&mut register, "resume").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Reconcile);
        assert_eq!(register.pending().len(), 1);
        assert_eq!(register.pending()[0].product_code.as_str(), TEA);
        assert_eq!(catalog.quantity_of(SUGAR).await, Some(4));

        catalog.clear_faults().await;
        assert_eq!(
            run(&mut register, "resume").await.unwrap(),
            "1 stock update(s) applied"
        );
        assert!(register.pending().is_empty());
        assert_eq!(catalog.quantity_of(TEA).await, Some(4));
        assert_eq!(catalog.quantity_of(SUGAR).await, Some(4));
    }

    #[tokio::test]
    async fn test_return_and_history() {
        let (mut register, catalog) = register().await;
        run(&mut register, &format!("add {}", TEA)).await.unwrap();
        run(&mut register, "checkout card Asha").await.unwrap();

        let bills = run(&mut register, "bills").await.unwrap();
        let bill_id = bills.split_whitespace().next().unwrap().to_string();

        let refund = run(&mut register, &format!("return {} {}:1", bill_id, TEA))
            .await
            .unwrap();
        assert!(refund.contains(&format!("RETURN: R-{}", bill_id)));
        assert!(refund.contains("-141.60"));
        assert_eq!(catalog.quantity_of(TEA).await, Some(4));

        let json = run(&mut register, &format!("export R-{}", bill_id)).await.unwrap();
        assert!(json.contains("\"isReturn\": true"));

        let err = run(&mut register, "show BILL-0-00").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_cart_errors_are_reported() {
        let (mut register, _) = register().await;

        let err = run(&mut register, "add 0000").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = run(&mut register, "checkout cash").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        assert_eq!(run(&mut register, "resume").await.unwrap(), "No stock updates pending");
        assert_eq!(run(&mut register, "quit").await.unwrap(), "quit");
    }
}
