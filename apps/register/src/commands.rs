//! # Till Commands
//!
//! Parses one line of cashier input into a [`Command`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  scan <code>                 barcode reader output                      │
//! │  add <code>                  typed product code                         │
//! │  qty <code> <+n|-n>          change a line's quantity                   │
//! │  remove <code>               drop a line                                │
//! │  cart                        show lines and totals                      │
//! │  products                    list the catalog snapshot                  │
//! │  refresh                     reload the catalog                         │
//! │  checkout <pay> [name] [--phone <number>]                               │
//! │  resume                      retry stock left pending by a checkout     │
//! │  bills                       bill history, newest first                 │
//! │  show <bill-id>              print a receipt                            │
//! │  export <bill-id>            receipt as JSON                            │
//! │  return <bill-id> <code>:<qty> ...                                      │
//! │  help | quit                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billbook_core::{PaymentMethod, ValidationError};
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  scan <code>                        add one unit from the scanner
  add <code>                         add one unit by product code
  qty <code> <+n|-n>                 change a line's quantity
  remove <code>                      remove a line
  cart                               show the cart
  products                           list products
  refresh                            reload the catalog
  checkout <cash|card|upi> [name] [--phone <number>]
  resume                             retry pending stock updates
  bills                              list bills, newest first
  show <bill-id>                     print a receipt
  export <bill-id>                   print a receipt as JSON
  return <bill-id> <code>:<qty> ...  return items against a bill
  help                               show this text
  quit                               leave the register";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scan(String),
    Add(String),
    Qty { code: String, delta: i64 },
    Remove(String),
    Cart,
    Products,
    Refresh,
    Checkout {
        payment_method: PaymentMethod,
        customer_name: String,
        customer_phone: Option<String>,
    },
    Resume,
    Bills,
    Show(String),
    Export(String),
    Return {
        bill_id: String,
        items: Vec<(String, i64)>,
    },
    Help,
    Quit,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unknown command: {0} (type 'help')")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Not a number: {0}")]
    InvalidNumber(String),

    #[error(transparent)]
    Payment(#[from] ValidationError),
}

/// Parses a non-blank input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match verb.to_lowercase().as_str() {
        "scan" => Command::Scan(single(&rest, "scan <code>")?),
        "add" => Command::Add(single(&rest, "add <code>")?),
        "qty" => match rest.as_slice() {
            [code, delta] => Command::Qty {
                code: code.to_string(),
                delta: parse_number(delta)?,
            },
            _ => return Err(ParseError::Usage("qty <code> <+n|-n>")),
        },
        "remove" | "rm" => Command::Remove(single(&rest, "remove <code>")?),
        "cart" | "totals" => Command::Cart,
        "products" => Command::Products,
        "refresh" => Command::Refresh,
        "checkout" | "pay" => parse_checkout(&rest)?,
        "resume" => Command::Resume,
        "bills" | "history" => Command::Bills,
        "show" => Command::Show(single(&rest, "show <bill-id>")?),
        "export" => Command::Export(single(&rest, "export <bill-id>")?),
        "return" => parse_return(&rest)?,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn single(rest: &[&str], usage: &'static str) -> Result<String, ParseError> {
    match rest {
        [one] => Ok(one.to_string()),
        _ => Err(ParseError::Usage(usage)),
    }
}

fn parse_number(raw: &str) -> Result<i64, ParseError> {
    raw.trim_start_matches('+')
        .parse()
        .map_err(|_| ParseError::InvalidNumber(raw.to_string()))
}

fn parse_checkout(rest: &[&str]) -> Result<Command, ParseError> {
    const USAGE: &str = "checkout <cash|card|upi> [name] [--phone <number>]";

    let (payment, rest) = rest.split_first().ok_or(ParseError::Usage(USAGE))?;
    let payment_method = payment.parse::<PaymentMethod>()?;

    let (name, phone) = match rest.iter().position(|w| *w == "--phone") {
        Some(at) => {
            let phone = &rest[at + 1..];
            if phone.is_empty() {
                return Err(ParseError::Usage(USAGE));
            }
            (&rest[..at], Some(phone.join(" ")))
        }
        None => (rest, None),
    };

    Ok(Command::Checkout {
        payment_method,
        customer_name: name.join(" "),
        customer_phone: phone,
    })
}

fn parse_return(rest: &[&str]) -> Result<Command, ParseError> {
    const USAGE: &str = "return <bill-id> <code>:<qty> ...";

    let (bill_id, pairs) = rest.split_first().ok_or(ParseError::Usage(USAGE))?;
    if pairs.is_empty() {
        return Err(ParseError::Usage(USAGE));
    }

    let items = pairs
        .iter()
        .map(|pair| {
            let (code, qty) = pair.split_once(':').ok_or(ParseError::Usage(USAGE))?;
            Ok((code.to_string(), parse_number(qty)?))
        })
        .collect::<Result<Vec<_>, ParseError>>()?;

    Ok(Command::Return {
        bill_id: bill_id.to_string(),
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(line: &str) -> Command {
        parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_blank_line_is_nothing() {
        assert!(parse("").unwrap().is_none());
        assert!(parse("   \t").unwrap().is_none());
    }

    #[test]
    fn test_cart_commands() {
        assert_eq!(ok("scan 8901234"), Command::Scan("8901234".to_string()));
        assert_eq!(ok("ADD 8901234"), Command::Add("8901234".to_string()));
        assert_eq!(
            ok("qty 8901234 +2"),
            Command::Qty {
                code: "8901234".to_string(),
                delta: 2
            }
        );
        assert_eq!(
            ok("qty 8901234 -1"),
            Command::Qty {
                code: "8901234".to_string(),
                delta: -1
            }
        );
        assert_eq!(ok("rm 8901234"), Command::Remove("8901234".to_string()));
        assert_eq!(ok("totals"), Command::Cart);
    }

    #[test]
    fn test_bad_arguments() {
        assert!(matches!(parse("scan"), Err(ParseError::Usage(_))));
        assert!(matches!(parse("qty 8901234"), Err(ParseError::Usage(_))));
        assert!(matches!(
            parse("qty 8901234 lots"),
            Err(ParseError::InvalidNumber(_))
        ));
        assert!(matches!(parse("dance"), Err(ParseError::Unknown(_))));
    }

    #[test]
    fn test_checkout_with_customer() {
        assert_eq!(
            ok("checkout card Ravi Kumar --phone 98765 43210"),
            Command::Checkout {
                payment_method: PaymentMethod::Card,
                customer_name: "Ravi Kumar".to_string(),
                customer_phone: Some("98765 43210".to_string()),
            }
        );
        assert_eq!(
            ok("pay UPI"),
            Command::Checkout {
                payment_method: PaymentMethod::Upi,
                customer_name: String::new(),
                customer_phone: None,
            }
        );
    }

    #[test]
    fn test_checkout_rejects_unknown_payment() {
        assert!(matches!(parse("checkout cheque"), Err(ParseError::Payment(_))));
        assert!(matches!(parse("checkout"), Err(ParseError::Usage(_))));
        assert!(matches!(
            parse("checkout cash Ravi --phone"),
            Err(ParseError::Usage(_))
        ));
    }

    #[test]
    fn test_return_pairs() {
        assert_eq!(
            ok("return BILL-1-01 8901:1 8902:2"),
            Command::Return {
                bill_id: "BILL-1-01".to_string(),
                items: vec![("8901".to_string(), 1), ("8902".to_string(), 2)],
            }
        );
        assert!(matches!(parse("return BILL-1-01"), Err(ParseError::Usage(_))));
        assert!(matches!(
            parse("return BILL-1-01 8901"),
            Err(ParseError::Usage(_))
        ));
    }
}
