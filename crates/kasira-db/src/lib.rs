//! # kasira-db: Persistence and Transactions for Kasira
//!
//! This crate provides database access for the Kasira settlement engine,
//! and owns its two transactional components: the settlement processor
//! and the receivable ledger. It uses SQLite for local storage with sqlx
//! for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasira Data Flow                                 │
//! │                                                                         │
//! │  Caller (settle / record payment / list receivables)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kasira-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Settlement  │  │   │
//! │  │   │   (pool.rs)   │    │  product sale │    │  Processor   │  │   │
//! │  │   │               │◄───│  member recv. │    │ (settlement) │  │   │
//! │  │   │ SqlitePool    │    │  suspended    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │            pricing and discount math: kasira-core              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode, embedded migrations)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`settlement`] - The atomic settlement processor
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasira_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/kasira.db")).await?;
//!
//! // Settle a cart
//! let receipt = db.settlement().settle(request).await?;
//!
//! // Record a repayment against the receivable it opened
//! if let Some(receivable) = &receipt.receivable {
//!     db.receivables()
//!         .apply_payment(&receivable.id, amount, method)
//!         .await?;
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod settlement;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use settlement::{SettleLine, SettleRequest, SettlementProcessor, SettlementReceipt};

// Repository re-exports for convenience
pub use repository::member::MemberRepository;
pub use repository::product::ProductRepository;
pub use repository::receivable::{
    AppliedPayment, PageRequest, ReceivableFilter, ReceivableRepository, ReceivablesPage,
};
pub use repository::sale::SaleRepository;
pub use repository::suspended::SuspendedSaleRepository;
