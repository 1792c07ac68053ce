//! # Cart Aggregator
//!
//! Holds the mutable line collection for one in-progress sale and keeps a
//! read-only monetary snapshot in lockstep with it.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   EMPTY  (no calculation)                                              │
//! │     │  add_line                                                         │
//! │     ▼                                                                   │
//! │   POPULATED  (calculation present)                                     │
//! │     │  any mutation: add / remove / quantity / member / discount       │
//! │     ▼                                                                   │
//! │   recompute the WHOLE calculation, replace the snapshot                │
//! │                                                                         │
//! │   remove last line ──► back to EMPTY                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Partial updates are deliberately impossible: one quantity change can
//! move that line across a tier threshold and shift the member-discount
//! base for every other line, so the snapshot is always rebuilt from
//! scratch by [`crate::calculation::compose`].
//!
//! ## Ownership
//! A `Cart` is a plain owned value handed to whoever runs the sale: one
//! cashier's in-progress sale, one cart, no process-wide shared state.
//! Hosts that service concurrent terminals keep one cart per terminal.
//!
//! ## Clamping vs Failing
//! Quantities clamp into `[1, stock ceiling]`. A clamp returns a
//! [`CartWarning`] so the UI can tell the cashier, but it never drops the
//! line and never errors. Settlement applies the strict check later.

use serde::{Deserialize, Serialize};

use crate::calculation::{compose, Calculation};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Member, PriceTier, Product, TaxRate};
use crate::MAX_CART_LINES;

// =============================================================================
// Cart Line
// =============================================================================

/// A line in an in-progress cart.
///
/// ## Design Notes
/// - `base_price_cents` and `tiers` are frozen copies of product pricing
///   taken when the line is added, so a concurrent product edit cannot
///   change a cart mid-sale. Settlement re-reads the authoritative data.
/// - `stock_ceiling` is the stock level observed at add time; quantity
///   clamps against it.
///
/// The same shape serializes into the JSON payload of a suspended sale,
/// which is how an attendant's cart travels to a cashier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product ID (UUID).
    pub product_id: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// Fallback unit price at time of adding (frozen).
    pub base_price_cents: i64,

    /// Tier table at time of adding (frozen).
    pub tiers: Vec<PriceTier>,

    /// Stock level observed at add time; the quantity ceiling.
    pub stock_ceiling: i64,

    /// Quantity, always within `[1, stock_ceiling]`.
    pub quantity: i64,

    /// Free-form cashier note for this line.
    pub note: Option<String>,
}

impl CartLine {
    /// Creates a line from a product snapshot. The quantity is clamped by
    /// the cart when the line is inserted, not here.
    pub fn from_product(product: &Product, tiers: Vec<PriceTier>, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            base_price_cents: product.base_price_cents,
            tiers,
            stock_ceiling: product.current_stock,
            quantity,
            note: None,
        }
    }

    /// Returns the fallback base price as Money.
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }
}

// =============================================================================
// Cart Warning
// =============================================================================

/// A non-fatal adjustment the cart made to keep itself consistent.
///
/// Warnings are returned to the caller for surfacing; they are never
/// silently discarded and never escalated to errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CartWarning {
    /// A requested quantity fell outside `[1, stock ceiling]` and was
    /// pulled back to the nearest bound. The line stays in the cart.
    QuantityClamped {
        product_id: String,
        requested: i64,
        clamped_to: i64,
    },
}

// =============================================================================
// Cart
// =============================================================================

/// The cart for one in-progress sale.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product merges
///   quantities)
/// - Every quantity sits inside `[1, stock ceiling]`
/// - `calculation()` is `Some` exactly when the cart has lines, and
///   always reflects the current lines, member, and discounts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
    member: Option<Member>,
    additional_discount_cents: i64,
    tax_rate: TaxRate,
    calculation: Option<Calculation>,
}

impl Cart {
    /// Creates a new empty cart with no tax.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            member: None,
            additional_discount_cents: 0,
            tax_rate: TaxRate::zero(),
            calculation: None,
        }
    }

    /// Creates an empty cart that taxes the discounted net at `rate`.
    pub fn with_tax_rate(rate: TaxRate) -> Self {
        Cart {
            tax_rate: rate,
            ..Cart::new()
        }
    }

    /// Rebuilds a cart from previously captured lines.
    ///
    /// This is the resume half of the suspended-sale hand-off: the
    /// attendant's serialized lines become a live cart for the cashier.
    /// Quantities are re-clamped against the captured ceilings; clamp
    /// warnings are returned alongside the cart.
    pub fn from_lines(
        lines: Vec<CartLine>,
        member: Option<Member>,
        tax_rate: TaxRate,
    ) -> CoreResult<(Self, Vec<CartWarning>)> {
        if lines.len() > MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        let mut cart = Cart {
            lines: Vec::new(),
            member,
            additional_discount_cents: 0,
            tax_rate,
            calculation: None,
        };

        let mut warnings = Vec::new();
        for mut line in lines {
            let requested = line.quantity;
            let clamped = clamp_quantity(requested, line.stock_ceiling);
            if clamped != requested {
                warnings.push(CartWarning::QuantityClamped {
                    product_id: line.product_id.clone(),
                    requested,
                    clamped_to: clamped,
                });
            }
            line.quantity = clamped;
            cart.lines.push(line);
        }

        cart.recompute();
        Ok((cart, warnings))
    }

    /// Adds a product to the cart, merging with an existing line.
    ///
    /// ## Behavior
    /// - Product already in cart: quantities merge, then clamp
    /// - New product: a fresh line with the product snapshot, clamped
    ///
    /// ## Returns
    /// `Ok(Some(warning))` when the quantity was clamped, `Ok(None)` on a
    /// clean add, `Err` only when the cart line limit is hit.
    pub fn add_line(
        &mut self,
        product: &Product,
        tiers: Vec<PriceTier>,
        quantity: i64,
    ) -> CoreResult<Option<CartWarning>> {
        // Merge with an existing line for the same product.
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            let requested = line.quantity + quantity;
            let clamped = clamp_quantity(requested, line.stock_ceiling);
            line.quantity = clamped;
            let warning = (clamped != requested).then(|| CartWarning::QuantityClamped {
                product_id: product.id.clone(),
                requested,
                clamped_to: clamped,
            });
            self.recompute();
            return Ok(warning);
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        let mut line = CartLine::from_product(product, tiers, quantity);
        let clamped = clamp_quantity(quantity, line.stock_ceiling);
        let warning = (clamped != quantity).then(|| CartWarning::QuantityClamped {
            product_id: product.id.clone(),
            requested: quantity,
            clamped_to: clamped,
        });
        line.quantity = clamped;
        self.lines.push(line);

        self.recompute();
        Ok(warning)
    }

    /// Sets the quantity of an existing line, clamping into
    /// `[1, stock ceiling]`.
    ///
    /// A request below one clamps UP to one rather than removing the
    /// line; removal is its own explicit operation.
    pub fn update_quantity(
        &mut self,
        product_id: &str,
        quantity: i64,
    ) -> CoreResult<Option<CartWarning>> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::LineNotInCart(product_id.to_string()))?;

        let clamped = clamp_quantity(quantity, line.stock_ceiling);
        line.quantity = clamped;
        let warning = (clamped != quantity).then(|| CartWarning::QuantityClamped {
            product_id: product_id.to_string(),
            requested: quantity,
            clamped_to: clamped,
        });

        self.recompute();
        Ok(warning)
    }

    /// Removes a line from the cart.
    pub fn remove_line(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == initial_len {
            return Err(CoreError::LineNotInCart(product_id.to_string()));
        }

        self.recompute();
        Ok(())
    }

    /// Attaches or detaches the member whose percentage discounts the
    /// subtotal.
    pub fn set_member(&mut self, member: Option<Member>) {
        self.member = member;
        self.recompute();
    }

    /// Sets the flat additional discount. Values outside `[0, subtotal]`
    /// are clamped during composition, not here, so the requested value
    /// survives later subtotal changes.
    pub fn set_additional_discount(&mut self, amount: Money) {
        self.additional_discount_cents = amount.cents();
        self.recompute();
    }

    /// Clears all lines and discounts, returning to the empty state.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.member = None;
        self.additional_discount_cents = 0;
        self.calculation = None;
    }

    /// The current lines.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The attached member, if any.
    pub fn member(&self) -> Option<&Member> {
        self.member.as_ref()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The read-only monetary snapshot.
    ///
    /// `None` exactly when the cart is empty. The snapshot is replaced
    /// wholesale on every mutation; callers must not cache it across
    /// mutations.
    pub fn calculation(&self) -> Option<&Calculation> {
        self.calculation.as_ref()
    }

    /// Re-enters the compositor and replaces the snapshot.
    fn recompute(&mut self) {
        if self.lines.is_empty() {
            self.calculation = None;
            return;
        }
        self.calculation = Some(compose(
            &self.lines,
            self.member.as_ref(),
            Money::from_cents(self.additional_discount_cents),
            self.tax_rate,
        ));
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

/// Pulls a quantity into `[1, ceiling]`. A ceiling below one still
/// admits a single unit; settlement is where an empty shelf turns into a
/// hard failure.
fn clamp_quantity(quantity: i64, ceiling: i64) -> i64 {
    quantity.clamp(1, ceiling.max(1))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_product(id: &str, price_cents: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            name: format!("Product {}", id),
            base_price_cents: price_cents,
            current_stock: stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_member(percent: u32) -> Member {
        Member {
            id: "m1".to_string(),
            name: "Member One".to_string(),
            phone: None,
            discount_percent: percent,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_cart_has_no_calculation() {
        let cart = Cart::new();
        assert!(cart.is_empty());
        assert!(cart.calculation().is_none());
    }

    #[test]
    fn test_add_line_populates_calculation() {
        let mut cart = Cart::new();
        let product = test_product("1", 999, 50);

        let warning = cart.add_line(&product, vec![], 2).unwrap();
        assert!(warning.is_none());

        let calc = cart.calculation().expect("calculation present");
        assert_eq!(calc.subtotal_cents, 1998);
        assert_eq!(calc.total_cents, 1998);
    }

    #[test]
    fn test_add_same_product_merges_quantities() {
        let mut cart = Cart::new();
        let product = test_product("1", 999, 50);

        cart.add_line(&product, vec![], 2).unwrap();
        cart.add_line(&product, vec![], 3).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
        assert_eq!(cart.calculation().unwrap().subtotal_cents, 4995);
    }

    #[test]
    fn test_quantity_clamps_to_stock_ceiling_with_warning() {
        let mut cart = Cart::new();
        let product = test_product("1", 1000, 3);

        let warning = cart.add_line(&product, vec![], 10).unwrap();
        assert_eq!(
            warning,
            Some(CartWarning::QuantityClamped {
                product_id: "1".to_string(),
                requested: 10,
                clamped_to: 3,
            })
        );

        // Line kept at the ceiling, never dropped.
        assert_eq!(cart.lines()[0].quantity, 3);
        assert_eq!(cart.calculation().unwrap().subtotal_cents, 3000);
    }

    #[test]
    fn test_merge_past_ceiling_clamps() {
        let mut cart = Cart::new();
        let product = test_product("1", 1000, 5);

        cart.add_line(&product, vec![], 4).unwrap();
        let warning = cart.add_line(&product, vec![], 4).unwrap();

        assert!(matches!(
            warning,
            Some(CartWarning::QuantityClamped {
                requested: 8,
                clamped_to: 5,
                ..
            })
        ));
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn test_update_quantity_below_one_clamps_up() {
        let mut cart = Cart::new();
        let product = test_product("1", 1000, 5);
        cart.add_line(&product, vec![], 3).unwrap();

        let warning = cart.update_quantity("1", 0).unwrap();
        assert!(matches!(
            warning,
            Some(CartWarning::QuantityClamped { clamped_to: 1, .. })
        ));
        assert_eq!(cart.lines()[0].quantity, 1);
    }

    #[test]
    fn test_quantity_change_can_shift_tier() {
        let mut cart = Cart::new();
        let product = test_product("1", 1000, 50);
        let tiers = vec![PriceTier::new(1, 1000), PriceTier::new(5, 900)];

        cart.add_line(&product, tiers, 4).unwrap();
        assert_eq!(cart.calculation().unwrap().subtotal_cents, 4000);

        // Crossing the threshold reprices the whole line.
        cart.update_quantity("1", 5).unwrap();
        let calc = cart.calculation().unwrap();
        assert_eq!(calc.subtotal_cents, 4500);
        assert_eq!(calc.item_discount_cents, 500);
    }

    #[test]
    fn test_member_change_recomputes_snapshot() {
        let mut cart = Cart::new();
        let product = test_product("1", 10_000, 50);
        cart.add_line(&product, vec![], 1).unwrap();

        cart.set_member(Some(test_member(10)));
        assert_eq!(cart.calculation().unwrap().member_discount_cents, 1000);

        cart.set_member(None);
        assert_eq!(cart.calculation().unwrap().member_discount_cents, 0);
    }

    #[test]
    fn test_remove_last_line_returns_to_empty() {
        let mut cart = Cart::new();
        let product = test_product("1", 1000, 5);
        cart.add_line(&product, vec![], 1).unwrap();

        cart.remove_line("1").unwrap();
        assert!(cart.is_empty());
        assert!(cart.calculation().is_none());
    }

    #[test]
    fn test_remove_unknown_line_errors() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.remove_line("ghost"),
            Err(CoreError::LineNotInCart(_))
        ));
    }

    #[test]
    fn test_from_lines_resumes_and_reclamps() {
        let lines = vec![CartLine {
            product_id: "1".to_string(),
            name: "Product 1".to_string(),
            base_price_cents: 1000,
            tiers: vec![],
            stock_ceiling: 2,
            quantity: 9,
            note: Some("for the blue basket".to_string()),
        }];

        let (cart, warnings) = Cart::from_lines(lines, None, TaxRate::zero()).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.calculation().unwrap().subtotal_cents, 2000);
    }

    #[test]
    fn test_cart_line_limit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_LINES {
            let product = test_product(&format!("p{}", i), 100, 10);
            cart.add_line(&product, vec![], 1).unwrap();
        }
        let one_more = test_product("overflow", 100, 10);
        assert!(matches!(
            cart.add_line(&one_more, vec![], 1),
            Err(CoreError::CartTooLarge { .. })
        ));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut cart = Cart::new();
        let product = test_product("1", 1000, 5);
        cart.add_line(&product, vec![], 2).unwrap();
        cart.set_member(Some(test_member(5)));
        cart.set_additional_discount(Money::from_cents(100));

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.calculation().is_none());
        assert!(cart.member().is_none());
    }
}
