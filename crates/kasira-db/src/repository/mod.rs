//! # Repository Module
//!
//! Database repository implementations for the settlement engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │                                                                 │
//! │       │  db.receivables().apply_payment(id, amount, method)            │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ReceivableRepository                                                  │
//! │  ├── apply_payment(&self, id, amount, method)                          │
//! │  ├── list_pending(&self, filter, page)                                 │
//! │  └── payments(&self, id)                                               │
//! │       │                                                                 │
//! │       │  SQL, transactions                                              │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated in one place per aggregate                          │
//! │  • Transaction boundaries live beside the queries they guard           │
//! │  • Clear separation of concerns                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Products, tiers, stock adjustments
//! - [`member::MemberRepository`] - Registered members
//! - [`sale::SaleRepository`] - Settled sale reads
//! - [`receivable::ReceivableRepository`] - The repayment ledger
//! - [`suspended::SuspendedSaleRepository`] - The attendant hand-off

pub mod member;
pub mod product;
pub mod receivable;
pub mod sale;
pub mod suspended;
