//! # Discount Composition
//!
//! Turns cart lines, a member, and a flat extra discount into one
//! internally consistent monetary breakdown.
//!
//! ## Composition Order (fixed, never reordered)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Per line: tier-resolved unit price                                  │
//! │       base_price   = resolve(tiers, 1)                                  │
//! │       unit_price   = resolve(tiers, qty)                                │
//! │       item_disc    = max(0, base - unit) x qty                          │
//! │       line_total   = unit x qty                                         │
//! │                                                                         │
//! │  2. subtotal = Σ line_total        (already net of tier savings)        │
//! │                                                                         │
//! │  3. member discount = subtotal x percent / 100                          │
//! │       computed on the POST-tier subtotal, never the base total:         │
//! │       the discount sources compose sequentially                         │
//! │                                                                         │
//! │  4. additional discount: flat amount, clamped to [0, subtotal].         │
//! │       Independent deduction; it does NOT shrink the member-discount     │
//! │       base.                                                             │
//! │                                                                         │
//! │  5. tax on the discounted net                                           │
//! │                                                                         │
//! │  6. total = max(0, subtotal - member - additional) + tax                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The whole breakdown is recomputed from scratch on every cart mutation.
//! Incremental patching is forbidden: a quantity change can move that
//! line to a different tier AND shift the member-discount base for every
//! other line, so there is no sound local update.
//!
//! Both the advisory client preview and the authoritative settlement call
//! [`compose`], which is how the two are guaranteed to agree.

use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::money::Money;
use crate::pricing::resolve_price;
use crate::types::{Member, TaxRate};

// =============================================================================
// Calculation
// =============================================================================

/// One priced line inside a [`Calculation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationLine {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    /// Unit price at quantity one (the reference price).
    pub base_price_cents: i64,
    /// Tier-resolved unit price actually charged.
    pub unit_price_cents: i64,
    /// Tier saving over the reference price, whole line.
    pub item_discount_cents: i64,
    /// unit_price x quantity.
    pub line_subtotal_cents: i64,
    pub note: Option<String>,
}

/// The full monetary breakdown of a cart.
///
/// Derived, never persisted until settlement, and always replaced
/// wholesale. Every field is consistent with every other:
/// `total == max(0, subtotal - member - additional) + tax` exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    pub lines: Vec<CalculationLine>,
    pub subtotal_cents: i64,
    pub item_discount_cents: i64,
    pub member_discount_cents: i64,
    /// The additional discount as applied, after clamping.
    pub additional_discount_cents: i64,
    /// True when the requested additional discount exceeded the subtotal
    /// and was clamped down. A warning for the caller to surface, not an
    /// error.
    pub additional_discount_clamped: bool,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl Calculation {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// Composes the full monetary breakdown for a set of cart lines.
///
/// Pure and side-effect free. `additional_discount` is clamped into
/// `[0, subtotal]` rather than rejected, so a stale client value can
/// never fail a recomputation; the clamp is reported on the result.
///
/// ## Example
/// ```rust
/// use kasira_core::calculation::compose;
/// use kasira_core::cart::CartLine;
/// use kasira_core::money::Money;
/// use kasira_core::types::{PriceTier, TaxRate};
///
/// let lines = vec![CartLine {
///     product_id: "p1".into(),
///     name: "Rice 5kg".into(),
///     base_price_cents: 10_000,
///     tiers: vec![PriceTier::new(1, 10_000), PriceTier::new(3, 9_000)],
///     stock_ceiling: 50,
///     quantity: 5,
///     note: None,
/// }];
///
/// let calc = compose(&lines, None, Money::from_cents(2_000), TaxRate::zero());
/// assert_eq!(calc.subtotal_cents, 45_000);
/// assert_eq!(calc.item_discount_cents, 5_000);
/// assert_eq!(calc.total_cents, 43_000);
/// ```
pub fn compose(
    lines: &[CartLine],
    member: Option<&Member>,
    additional_discount: Money,
    tax_rate: TaxRate,
) -> Calculation {
    let mut calc_lines = Vec::with_capacity(lines.len());
    let mut subtotal = Money::zero();
    let mut item_discount_total = Money::zero();

    for line in lines {
        let base_price = resolve_price(&line.tiers, line.base_price(), 1);
        let unit_price = resolve_price(&line.tiers, line.base_price(), line.quantity);

        // Tier tables are expected to price larger quantities lower; a
        // misconfigured table must not produce a negative "saving".
        let per_unit_saving = (base_price - unit_price).clamp_at_zero();
        let item_discount = per_unit_saving.multiply_quantity(line.quantity);
        let line_subtotal = unit_price.multiply_quantity(line.quantity);

        subtotal += line_subtotal;
        item_discount_total += item_discount;

        calc_lines.push(CalculationLine {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            base_price_cents: base_price.cents(),
            unit_price_cents: unit_price.cents(),
            item_discount_cents: item_discount.cents(),
            line_subtotal_cents: line_subtotal.cents(),
            note: line.note.clone(),
        });
    }

    let member_discount = match member {
        Some(m) => subtotal.percent_of(m.discount_percent),
        None => Money::zero(),
    };

    // Clamp instead of reject: an idempotent safety net for stale or
    // malformed caller input.
    let requested_additional = additional_discount.clamp_at_zero();
    let additional = if requested_additional > subtotal {
        subtotal
    } else {
        requested_additional
    };
    let clamped = additional != additional_discount;

    let net = (subtotal - member_discount - additional).clamp_at_zero();
    let tax = if tax_rate.is_zero() {
        Money::zero()
    } else {
        net.calculate_tax(tax_rate)
    };
    let total = net + tax;

    Calculation {
        lines: calc_lines,
        subtotal_cents: subtotal.cents(),
        item_discount_cents: item_discount_total.cents(),
        member_discount_cents: member_discount.cents(),
        additional_discount_cents: additional.cents(),
        additional_discount_clamped: clamped,
        tax_cents: tax.cents(),
        total_cents: total.cents(),
    }
}

// =============================================================================
// Tender Assessment
// =============================================================================

/// The settlement decision for a finalized total and a tendered payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementOutcome {
    /// Tendered covers the total; the sale closes paid.
    Paid,
    /// Tendered falls short; the balance becomes a receivable.
    Receivable,
}

/// The decision boundary between a paid sale and a receivable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenderAssessment {
    pub outcome: SettlementOutcome,
    /// Returned to the customer. Zero on the receivable path.
    pub change: Money,
    /// Amount still owed. Zero on the paid path.
    pub shortfall: Money,
}

/// Assesses a tendered payment against the authoritative grand total.
///
/// `tendered == total` is PAID with zero change; `tendered == total - 1`
/// is RECEIVABLE owing the full total. The boundary is exact.
pub fn assess_tender(grand_total: Money, tendered: Money) -> TenderAssessment {
    if tendered >= grand_total {
        TenderAssessment {
            outcome: SettlementOutcome::Paid,
            change: tendered - grand_total,
            shortfall: Money::zero(),
        }
    } else {
        TenderAssessment {
            outcome: SettlementOutcome::Receivable,
            change: Money::zero(),
            shortfall: grand_total - tendered,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
