//! # Repository Module
//!
//! Database repository implementations for Billbook POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  billbook-engine store adapters                                        │
//! │       │                                                                 │
//! │       │  db.products().get_by_code("8901063010017")                    │
//! │       │  db.bills().insert(&bill)                                      │
//! │       ▼                                                                 │
//! │  ProductRepository              BillRepository                         │
//! │  ├── get_by_code / get_by_id    ├── insert (header + items, one tx)    │
//! │  ├── list_all                   ├── list_ordered_by_date_desc          │
//! │  ├── insert                     ├── get_by_bill_id                     │
//! │  ├── set_quantity               └── list_returns_for                   │
//! │  └── compare_and_set_quantity                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No repository method spans both tables: a checkout touches the ledger
//! and the catalog through separate calls.

pub mod bill;
pub mod product;
