//! # kasira-core: Pure Settlement Logic for Kasira
//!
//! This crate is the **heart** of the Kasira settlement engine. It turns
//! a mutable shopping cart into a final, internally consistent monetary
//! total, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Kasira Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   Caller (POS terminal / API)                   │   │
//! │  │    cart preview ──► settle ──► record receivable payments       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kasira-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pricing  │  │calculation│  │   cart    │  │ validation│  │   │
//! │  │   │ tier      │  │ discount  │  │ aggregator│  │   rules   │  │   │
//! │  │   │ resolver  │  │ compositor│  │ snapshot  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  kasira-db (Database Layer)                     │   │
//! │  │     Settlement Processor, Receivable Ledger, repositories       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Member, Sale, Receivable, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Quantity-tiered unit price resolution
//! - [`calculation`] - Discount composition and the tender decision
//! - [`cart`] - The cart aggregator and its calculation snapshot
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic - same input =
//!    same output. The client preview and the server-authoritative
//!    settlement run the SAME code, so they cannot drift.
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are integer minor units;
//!    percentage results round half-up exactly once, never per line
//! 4. **Explicit Errors**: all errors are typed, never strings or panics;
//!    deliberate clamping is a typed warning, distinct from errors
//!
//! ## Example Usage
//!
//! ```rust
//! use kasira_core::cart::Cart;
//! use kasira_core::money::Money;
//! use kasira_core::pricing::resolve_price;
//! use kasira_core::types::PriceTier;
//!
//! // Tiered pricing: 1+ at 1000, 5+ at 900, 10+ at 800
//! let tiers = vec![
//!     PriceTier::new(1, 1000),
//!     PriceTier::new(5, 900),
//!     PriceTier::new(10, 800),
//! ];
//!
//! let unit = resolve_price(&tiers, Money::from_cents(1100), 7);
//! assert_eq!(unit.cents(), 900);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calculation;
pub mod cart;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use kasira_core::Money` instead of
// `use kasira_core::money::Money`

pub use calculation::{assess_tender, compose, Calculation, SettlementOutcome};
pub use cart::{Cart, CartLine, CartWarning};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::resolve_price;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps transaction sizes reasonable.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
