//! # Domain Types
//!
//! Core domain types for the Kasira settlement engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │   Receivable    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  receipt_number │   │  sale_id (FK)   │       │
//! │  │  base price     │   │  status         │   │  amount_due     │       │
//! │  │  current_stock  │   │  totals         │   │  amount_paid    │       │
//! │  └────────┬────────┘   └─────────────────┘   └─────────────────┘       │
//! │           │                                                             │
//! │  ┌────────┴────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   PriceTier     │   │   SaleStatus    │   │ReceivableStatus │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  min_qty        │   │  Unpaid         │   │  Unpaid         │       │
//! │  │  price_cents    │   │  Paid           │   │  PartiallyPaid  │       │
//! │  └─────────────────┘   └─────────────────┘   │  Paid (final)   │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: (sku, receipt_number) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10%
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Price Tier
// =============================================================================

/// A quantity-tiered unit price.
///
/// A product carries zero or more tiers; the tier with the largest
/// `min_qty` not exceeding the purchased quantity supplies the unit
/// price. See [`crate::pricing::resolve_price`] for the resolution rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct PriceTier {
    /// Minimum quantity for this tier to apply (>= 1).
    pub min_qty: i64,

    /// Unit price in minor units at this tier.
    pub price_cents: i64,
}

impl PriceTier {
    /// Creates a tier.
    pub const fn new(min_qty: i64, price_cents: i64) -> Self {
        PriceTier {
            min_qty,
            price_cents,
        }
    }

    /// Returns the tier price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Fallback unit price in minor units, used when no tier qualifies
    /// because the product has no tiers at all.
    pub base_price_cents: i64,

    /// Current stock level. The cart clamps against it; settlement
    /// enforces it.
    pub current_stock: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the fallback base price as a Money type.
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }
}

// =============================================================================
// Member
// =============================================================================

/// A registered customer.
///
/// Read-only input to the discount composition: the member's percentage
/// applies to the already-tier-discounted subtotal. Only registered
/// members may carry a receivable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Member {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,

    /// Whole-percent discount, 0 to 100.
    pub discount_percent: u32,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The payment status of a persisted sale.
///
/// A sale is created exactly once, fully paid or not; the only mutation
/// it ever sees afterwards is `Unpaid -> Paid`, driven by its receivable
/// reaching full repayment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Tendered payment covered the total at settlement.
    Paid,
    /// Tendered payment was short; a receivable carries the balance.
    Unpaid,
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Bank transfer.
    Transfer,
}

// =============================================================================
// Receivable Status
// =============================================================================

/// Repayment state of a receivable.
///
/// ## State Machine
/// ```text
/// unpaid ──(payment, paid < due)──► partially_paid ──(paid == due)──► paid
///    │                                                                 ▲
///    └──────────────────(payment, paid == due)─────────────────────────┘
///
/// paid is terminal. Transitions never go backward.
/// ```
///
/// The status is never stored authority: it is always a pure function of
/// `(amount_paid, amount_due)`, recomputed on every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ReceivableStatus {
    /// No repayment recorded yet.
    Unpaid,
    /// Some repayment recorded, balance still outstanding.
    PartiallyPaid,
    /// Fully repaid. Terminal.
    Paid,
}

impl ReceivableStatus {
    /// Derives the status from the amounts.
    ///
    /// ## Example
    /// ```rust
    /// use kasira_core::money::Money;
    /// use kasira_core::types::ReceivableStatus;
    ///
    /// let due = Money::from_cents(10_000);
    /// assert_eq!(
    ///     ReceivableStatus::for_amounts(Money::zero(), due),
    ///     ReceivableStatus::Unpaid
    /// );
    /// assert_eq!(
    ///     ReceivableStatus::for_amounts(Money::from_cents(4_000), due),
    ///     ReceivableStatus::PartiallyPaid
    /// );
    /// assert_eq!(
    ///     ReceivableStatus::for_amounts(due, due),
    ///     ReceivableStatus::Paid
    /// );
    /// ```
    pub fn for_amounts(amount_paid: Money, amount_due: Money) -> Self {
        if amount_paid >= amount_due {
            ReceivableStatus::Paid
        } else if amount_paid.is_positive() {
            ReceivableStatus::PartiallyPaid
        } else {
            ReceivableStatus::Unpaid
        }
    }

    /// Whether this state accepts further payments.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReceivableStatus::Paid)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A settled sale.
///
/// Created exactly once per settlement with its full discount breakdown;
/// line items are immutable thereafter. The only later mutation is the
/// status flip driven by the receivable ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub receipt_number: String,
    pub status: SaleStatus,
    pub member_id: Option<String>,
    pub cashier_id: String,
    /// Set when the cart was assembled by an attendant and handed off.
    pub attendant_id: Option<String>,
    pub subtotal_cents: i64,
    pub item_discount_cents: i64,
    pub member_discount_cents: i64,
    pub additional_discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub tendered_cents: i64,
    pub change_cents: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the tendered amount as Money.
    #[inline]
    pub fn tendered(&self) -> Money {
        Money::from_cents(self.tendered_cents)
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// A line item in a settled sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price at quantity one at time of sale (frozen).
    pub base_price_cents: i64,
    /// Tier-resolved unit price actually charged (frozen).
    pub unit_price_cents: i64,
    /// Quantity sold.
    pub quantity: i64,
    /// Tier saving over the base price, for the whole line.
    pub item_discount_cents: i64,
    /// unit_price x quantity.
    pub line_subtotal_cents: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SaleLine {
    /// Returns the charged unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line subtotal as Money.
    #[inline]
    pub fn line_subtotal(&self) -> Money {
        Money::from_cents(self.line_subtotal_cents)
    }
}

// =============================================================================
// Receivable
// =============================================================================

/// An amount still owed by a member after an under-paid sale.
///
/// Created only alongside its sale, mutated solely by the ledger's
/// apply-payment operation. Invariant: `amount_paid <= amount_due`,
/// enforced by the guarded UPDATE in the ledger and backed by a database
/// CHECK constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Receivable {
    pub id: String,
    pub sale_id: String,
    pub member_id: String,
    pub amount_due_cents: i64,
    pub amount_paid_cents: i64,
    pub status: ReceivableStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Receivable {
    /// Returns the total debt as Money.
    #[inline]
    pub fn amount_due(&self) -> Money {
        Money::from_cents(self.amount_due_cents)
    }

    /// Returns the accumulated repayment as Money.
    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_cents(self.amount_paid_cents)
    }

    /// Returns the outstanding balance.
    #[inline]
    pub fn remaining(&self) -> Money {
        self.amount_due() - self.amount_paid()
    }
}

// =============================================================================
// Receivable Payment
// =============================================================================

/// A single repayment recorded against a receivable.
/// Kept as history; the aggregate on the receivable is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ReceivablePayment {
    pub id: String,
    pub receivable_id: String,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl ReceivablePayment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
