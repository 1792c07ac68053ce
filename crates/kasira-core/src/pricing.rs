//! # Tier Price Resolution
//!
//! Maps a product's quantity tiers and a requested quantity to the unit
//! price that applies.
//!
//! ## Resolution Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Tiers: [{min_qty: 1, price: 1000}, {5, 900}, {10, 800}]               │
//! │                                                                         │
//! │  quantity 1..4   ──► 1000   (largest min_qty <= qty is 1)              │
//! │  quantity 5..9   ──►  900   (largest min_qty <= qty is 5)              │
//! │  quantity 10+    ──►  800   (largest min_qty <= qty is 10)             │
//! │                                                                         │
//! │  No tier qualifies (all min_qty > qty) ──► smallest-min_qty tier       │
//! │  No tiers at all                       ──► product base price          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The resolver is pure and deterministic. The discount composition calls
//! it twice per line with identical tier data: once at quantity one for
//! the reference price and once at the requested quantity for the charged
//! price. The difference between the two is the per-item tier saving.

use crate::money::Money;
use crate::types::PriceTier;

/// Resolves the unit price for a quantity against a set of price tiers.
///
/// `tiers` may arrive in any order; resolution sorts a copy ascending by
/// `min_qty` and scans from the highest tier down, returning the first
/// tier whose `min_qty` does not exceed `quantity`. When every tier
/// demands more than `quantity`, the smallest-`min_qty` tier applies.
/// When there are no tiers, `base_price` applies.
///
/// ## Example
/// ```rust
/// use kasira_core::money::Money;
/// use kasira_core::pricing::resolve_price;
/// use kasira_core::types::PriceTier;
///
/// let tiers = vec![
///     PriceTier::new(10, 800),
///     PriceTier::new(1, 1000),
///     PriceTier::new(5, 900),
/// ];
/// let base = Money::from_cents(1100);
///
/// assert_eq!(resolve_price(&tiers, base, 7).cents(), 900);
/// assert_eq!(resolve_price(&tiers, base, 1).cents(), 1000);
/// assert_eq!(resolve_price(&tiers, base, 20).cents(), 800);
/// assert_eq!(resolve_price(&[], base, 7).cents(), 1100);
/// ```
pub fn resolve_price(tiers: &[PriceTier], base_price: Money, quantity: i64) -> Money {
    if tiers.is_empty() {
        return base_price;
    }

    let mut sorted: Vec<&PriceTier> = tiers.iter().collect();
    sorted.sort_by_key(|t| t.min_qty);

    // Scan from the highest threshold down; first tier the quantity
    // reaches wins.
    for tier in sorted.iter().rev() {
        if tier.min_qty <= quantity {
            return tier.price();
        }
    }

    // Quantity is below every threshold: the lowest tier applies.
    sorted[0].price()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> Vec<PriceTier> {
        vec![
            PriceTier::new(1, 1000),
            PriceTier::new(5, 900),
            PriceTier::new(10, 800),
        ]
    }

    #[test]
    fn test_resolves_largest_qualifying_tier() {
        let base = Money::from_cents(1200);
        assert_eq!(resolve_price(&tiers(), base, 1).cents(), 1000);
        assert_eq!(resolve_price(&tiers(), base, 4).cents(), 1000);
        assert_eq!(resolve_price(&tiers(), base, 5).cents(), 900);
        assert_eq!(resolve_price(&tiers(), base, 7).cents(), 900);
        assert_eq!(resolve_price(&tiers(), base, 10).cents(), 800);
        assert_eq!(resolve_price(&tiers(), base, 20).cents(), 800);
    }

    #[test]
    fn test_unordered_input_resolves_identically() {
        let shuffled = vec![
            PriceTier::new(10, 800),
            PriceTier::new(1, 1000),
            PriceTier::new(5, 900),
        ];
        let base = Money::from_cents(1200);
        for qty in 1..=20 {
            assert_eq!(
                resolve_price(&shuffled, base, qty),
                resolve_price(&tiers(), base, qty),
                "qty {}",
                qty
            );
        }
    }

    #[test]
    fn test_below_every_threshold_uses_lowest_tier() {
        // No tier at min_qty 1: quantity 1 falls below all thresholds.
        let wholesale_only = vec![PriceTier::new(12, 700), PriceTier::new(6, 850)];
        let base = Money::from_cents(1200);
        assert_eq!(resolve_price(&wholesale_only, base, 1).cents(), 850);
        assert_eq!(resolve_price(&wholesale_only, base, 6).cents(), 850);
        assert_eq!(resolve_price(&wholesale_only, base, 12).cents(), 700);
    }

    #[test]
    fn test_no_tiers_falls_back_to_base_price() {
        let base = Money::from_cents(1200);
        assert_eq!(resolve_price(&[], base, 1), base);
        assert_eq!(resolve_price(&[], base, 99), base);
    }

    #[test]
    fn test_idempotent_for_identical_inputs() {
        let base = Money::from_cents(1200);
        let first = resolve_price(&tiers(), base, 7);
        let second = resolve_price(&tiers(), base, 7);
        assert_eq!(first, second);
    }
}
