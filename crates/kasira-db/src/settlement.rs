//! # Settlement Processor
//!
//! Turns a finalized cart plus a tendered payment into a persisted sale,
//! atomically.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  settle(request)                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate input (quantities, tender, cashier)                          │
//! │       │                                                                 │
//! │       ▼  BEGIN ─────────────────────────────────────────────┐          │
//! │  re-read member, products, tiers (client numbers are        │          │
//! │  advisory only; the charge is recomputed here)              │          │
//! │       │                                                     │          │
//! │       ▼                                                     │          │
//! │  guarded stock decrement per line                           │          │
//! │       ├── shelf short ──► InsufficientStock, ROLLBACK       │          │
//! │       ▼                                                     │          │
//! │  compose() ──► authoritative grand total                    │          │
//! │       │                                                     │          │
//! │       ▼                                                     │          │
//! │  assess tender                                              │          │
//! │       ├── covered ──► sale (paid), change                   │          │
//! │       └── short ───► member required; sale (unpaid)         │          │
//! │                      + receivable + opening ledger entry    │          │
//! │       │                                                     │          │
//! │       ▼  COMMIT ────────────────────────────────────────────┘          │
//! │  sale + lines + stock + receivable persist together or not at all     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A short tender with a nonzero amount is accepted: the tendered part is
//! recorded upfront as the receivable's opening payment and the balance
//! is owed. Saving a sale entirely as debt is the same path with zero
//! tendered.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use sqlx::SqlitePool;

use crate::error::DbResult;
use kasira_core::validation::{
    validate_additional_discount, validate_note, validate_quantity, validate_required_id,
    validate_tendered_amount,
};
use kasira_core::{
    assess_tender, compose, Calculation, CartLine, CoreError, Member, Money, PaymentMethod,
    PriceTier, Product, Receivable, ReceivablePayment, ReceivableStatus, Sale, SaleLine,
    SaleStatus, SettlementOutcome, TaxRate, ValidationError,
};

// =============================================================================
// Request / Response Types
// =============================================================================

/// One requested line of a settlement. Only the product reference,
/// quantity and note travel from the client; pricing is re-read
/// server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleLine {
    pub product_id: String,
    pub quantity: i64,
    pub note: Option<String>,
}

impl From<&CartLine> for SettleLine {
    fn from(line: &CartLine) -> Self {
        SettleLine {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            note: line.note.clone(),
        }
    }
}

/// A settlement request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    pub lines: Vec<SettleLine>,
    pub member_id: Option<String>,
    pub additional_discount_cents: i64,
    pub payment_method: PaymentMethod,
    pub tendered_cents: i64,
    pub cashier_id: String,
    /// Set when the cart came through the attendant hand-off.
    pub attendant_id: Option<String>,
    pub note: Option<String>,
}

/// Everything a caller needs after a settlement: the decision, the
/// persisted records, and the change to hand back.
#[derive(Debug, Clone)]
pub struct SettlementReceipt {
    pub outcome: SettlementOutcome,
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
    pub receivable: Option<Receivable>,
    pub change_cents: i64,
    /// The authoritative breakdown the totals came from.
    pub calculation: Calculation,
}

// =============================================================================
// Processor
// =============================================================================

/// The settlement processor.
///
/// Stateless over a pool; one call is one transaction.
#[derive(Debug, Clone)]
pub struct SettlementProcessor {
    pool: SqlitePool,
    tax_rate: TaxRate,
}

impl SettlementProcessor {
    /// Creates a processor taxing the discounted net at `tax_rate`.
    pub fn new(pool: SqlitePool, tax_rate: TaxRate) -> Self {
        SettlementProcessor { pool, tax_rate }
    }

    /// Settles a cart.
    ///
    /// The submitted lines carry product references and quantities only;
    /// member discount, tier prices and stock are re-read inside the
    /// transaction, so a stale or dishonest client total can never
    /// become the charge.
    ///
    /// ## Failure Modes
    /// - `Validation` - malformed input, nothing read or written
    /// - `ProductNotFound` / `MemberNotFound` - unknown references
    /// - `InsufficientStock` - a line the shelf cannot cover; fatal to
    ///   the whole settlement
    /// - `ReceivableRequiresMember` - short tender without a member
    /// - `ConcurrencyConflict` - lost a race on stock; retry the call
    ///
    /// Every failure leaves no partial state.
    pub async fn settle(&self, request: SettleRequest) -> DbResult<SettlementReceipt> {
        self.validate(&request)?;

        debug!(
            lines = request.lines.len(),
            tendered = request.tendered_cents,
            "Settling cart"
        );

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Authoritative member read; the discount percent comes from
        // here, never from the client.
        let member = match &request.member_id {
            Some(id) => Some(
                sqlx::query_as::<_, Member>(
                    r#"
                    SELECT id, name, phone, discount_percent, is_active,
                           created_at, updated_at
                    FROM members
                    WHERE id = ?1 AND is_active = 1
                    "#,
                )
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| CoreError::MemberNotFound(id.clone()))?,
            ),
            None => None,
        };

        // Re-read each product, take its stock, and snapshot its tiers.
        // The decrement is conditional on sufficient stock; a line the
        // shelf cannot cover aborts the whole settlement.
        let mut cart_lines = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let product = sqlx::query_as::<_, Product>(
                r#"
                SELECT id, sku, name, base_price_cents, current_stock,
                       is_active, created_at, updated_at
                FROM products
                WHERE id = ?1 AND is_active = 1
                "#,
            )
            .bind(&line.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            let decremented = sqlx::query(
                r#"
                UPDATE products
                SET current_stock = current_stock - ?2, updated_at = ?3
                WHERE id = ?1 AND current_stock >= ?2
                "#,
            )
            .bind(&product.id)
            .bind(line.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                return Err(CoreError::InsufficientStock {
                    name: product.name,
                    available: product.current_stock,
                    requested: line.quantity,
                }
                .into());
            }

            let tiers = sqlx::query_as::<_, PriceTier>(
                r#"
                SELECT min_qty, price_cents
                FROM price_tiers
                WHERE product_id = ?1
                ORDER BY min_qty
                "#,
            )
            .bind(&product.id)
            .fetch_all(&mut *tx)
            .await?;

            let mut cart_line = CartLine::from_product(&product, tiers, line.quantity);
            cart_line.note = line.note.clone();
            cart_lines.push(cart_line);
        }

        // The same compositor the preview runs; identical inputs,
        // identical totals.
        let calculation = compose(
            &cart_lines,
            member.as_ref(),
            Money::from_cents(request.additional_discount_cents),
            self.tax_rate,
        );

        if calculation.additional_discount_clamped {
            warn!(
                requested = request.additional_discount_cents,
                applied = calculation.additional_discount_cents,
                "Additional discount clamped to subtotal"
            );
        }

        let assessment = assess_tender(
            calculation.total(),
            Money::from_cents(request.tendered_cents),
        );

        if assessment.outcome == SettlementOutcome::Receivable && member.is_none() {
            return Err(CoreError::ReceivableRequiresMember.into());
        }

        let sale_id = Uuid::new_v4().to_string();
        let sale = Sale {
            id: sale_id.clone(),
            receipt_number: generate_receipt_number(&request.cashier_id),
            status: match assessment.outcome {
                SettlementOutcome::Paid => SaleStatus::Paid,
                SettlementOutcome::Receivable => SaleStatus::Unpaid,
            },
            member_id: member.as_ref().map(|m| m.id.clone()),
            cashier_id: request.cashier_id.clone(),
            attendant_id: request.attendant_id.clone(),
            subtotal_cents: calculation.subtotal_cents,
            item_discount_cents: calculation.item_discount_cents,
            member_discount_cents: calculation.member_discount_cents,
            additional_discount_cents: calculation.additional_discount_cents,
            tax_cents: calculation.tax_cents,
            total_cents: calculation.total_cents,
            payment_method: request.payment_method,
            tendered_cents: request.tendered_cents,
            change_cents: assessment.change.cents(),
            note: request.note.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, receipt_number, status, member_id, cashier_id,
                attendant_id, subtotal_cents, item_discount_cents,
                member_discount_cents, additional_discount_cents,
                tax_cents, total_cents, payment_method, tendered_cents,
                change_cents, note, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18
            )
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.receipt_number)
        .bind(sale.status)
        .bind(&sale.member_id)
        .bind(&sale.cashier_id)
        .bind(&sale.attendant_id)
        .bind(sale.subtotal_cents)
        .bind(sale.item_discount_cents)
        .bind(sale.member_discount_cents)
        .bind(sale.additional_discount_cents)
        .bind(sale.tax_cents)
        .bind(sale.total_cents)
        .bind(sale.payment_method)
        .bind(sale.tendered_cents)
        .bind(sale.change_cents)
        .bind(&sale.note)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        let mut sale_lines = Vec::with_capacity(calculation.lines.len());
        for calc_line in &calculation.lines {
            let sale_line = SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: calc_line.product_id.clone(),
                name_snapshot: calc_line.name.clone(),
                base_price_cents: calc_line.base_price_cents,
                unit_price_cents: calc_line.unit_price_cents,
                quantity: calc_line.quantity,
                item_discount_cents: calc_line.item_discount_cents,
                line_subtotal_cents: calc_line.line_subtotal_cents,
                note: calc_line.note.clone(),
                created_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO sale_lines (
                    id, sale_id, product_id, name_snapshot,
                    base_price_cents, unit_price_cents, quantity,
                    item_discount_cents, line_subtotal_cents, note,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(&sale_line.id)
            .bind(&sale_line.sale_id)
            .bind(&sale_line.product_id)
            .bind(&sale_line.name_snapshot)
            .bind(sale_line.base_price_cents)
            .bind(sale_line.unit_price_cents)
            .bind(sale_line.quantity)
            .bind(sale_line.item_discount_cents)
            .bind(sale_line.line_subtotal_cents)
            .bind(&sale_line.note)
            .bind(sale_line.created_at)
            .execute(&mut *tx)
            .await?;

            sale_lines.push(sale_line);
        }

        let receivable = if assessment.outcome == SettlementOutcome::Receivable {
            // Checked above; the receivable path always has a member.
            let member_id = member
                .as_ref()
                .map(|m| m.id.clone())
                .ok_or(CoreError::ReceivableRequiresMember)?;

            let amount_paid = Money::from_cents(request.tendered_cents);
            let receivable = Receivable {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                member_id,
                amount_due_cents: calculation.total_cents,
                amount_paid_cents: amount_paid.cents(),
                status: ReceivableStatus::for_amounts(amount_paid, calculation.total()),
                created_at: now,
                updated_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO receivables (
                    id, sale_id, member_id, amount_due_cents,
                    amount_paid_cents, status, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&receivable.id)
            .bind(&receivable.sale_id)
            .bind(&receivable.member_id)
            .bind(receivable.amount_due_cents)
            .bind(receivable.amount_paid_cents)
            .bind(receivable.status)
            .bind(receivable.created_at)
            .bind(receivable.updated_at)
            .execute(&mut *tx)
            .await?;

            // The upfront partial tender opens the ledger history, so
            // the history always sums to amount_paid.
            if amount_paid.is_positive() {
                let opening = ReceivablePayment {
                    id: Uuid::new_v4().to_string(),
                    receivable_id: receivable.id.clone(),
                    method: request.payment_method,
                    amount_cents: amount_paid.cents(),
                    created_at: now,
                };
                sqlx::query(
                    r#"
                    INSERT INTO receivable_payments (
                        id, receivable_id, method, amount_cents, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                )
                .bind(&opening.id)
                .bind(&opening.receivable_id)
                .bind(opening.method)
                .bind(opening.amount_cents)
                .bind(opening.created_at)
                .execute(&mut *tx)
                .await?;
            }

            Some(receivable)
        } else {
            None
        };

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            receipt_number = %sale.receipt_number,
            outcome = ?assessment.outcome,
            total = calculation.total_cents,
            tendered = request.tendered_cents,
            change = assessment.change.cents(),
            "Sale settled"
        );

        Ok(SettlementReceipt {
            outcome: assessment.outcome,
            sale,
            lines: sale_lines,
            receivable,
            change_cents: assessment.change.cents(),
            calculation,
        })
    }

    /// Composes an advisory breakdown for client-held cart lines.
    ///
    /// The lines carry the client's price snapshots; only the member's
    /// discount percent is read from the database. Nothing is written
    /// and no stock is checked: this is the preview half of the shared
    /// compositor, and its output carries no authority at settlement.
    pub async fn preview(
        &self,
        lines: &[CartLine],
        member_id: Option<&str>,
        additional_discount_cents: i64,
    ) -> DbResult<Calculation> {
        validate_additional_discount(additional_discount_cents).map_err(CoreError::from)?;

        let member = match member_id {
            Some(id) => Some(
                sqlx::query_as::<_, Member>(
                    r#"
                    SELECT id, name, phone, discount_percent, is_active,
                           created_at, updated_at
                    FROM members
                    WHERE id = ?1 AND is_active = 1
                    "#,
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| CoreError::MemberNotFound(id.to_string()))?,
            ),
            None => None,
        };

        Ok(compose(
            lines,
            member.as_ref(),
            Money::from_cents(additional_discount_cents),
            self.tax_rate,
        ))
    }

    fn validate(&self, request: &SettleRequest) -> Result<(), CoreError> {
        if request.lines.is_empty() {
            return Err(ValidationError::Required {
                field: "lines".to_string(),
            }
            .into());
        }
        for line in &request.lines {
            validate_required_id("product_id", &line.product_id)?;
            validate_quantity(line.quantity)?;
            validate_note(line.note.as_deref())?;
        }
        validate_required_id("cashier_id", &request.cashier_id)?;
        validate_tendered_amount(request.tendered_cents)?;
        validate_additional_discount(request.additional_discount_cents)?;
        validate_note(request.note.as_deref())?;
        Ok(())
    }
}

/// Generates a receipt number in format: YYYYMMDD-CC-NNNN
///
/// ## Format
/// - YYYYMMDD: date
/// - CC: cashier code (last 2 chars of cashier_id)
/// - NNNN: sequence (timestamp-derived)
fn generate_receipt_number(cashier_id: &str) -> String {
    let now = Utc::now();
    let date_part = now.format("%Y%m%d");

    let code: String = cashier_id
        .chars()
        .rev()
        .take(2)
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    let code = if code.len() < 2 {
        "00".to_string()
    } else {
        code
    };

    let seq = (now.timestamp_millis() % 10000) as u32;

    format!("{}-{}-{:04}", date_part, code, seq)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::member::generate_member_id;
    use crate::repository::product::generate_product_id;
    use crate::DbError;

    async fn seed_member(db: &Database, percent: u32) -> Member {
        let now = Utc::now();
        let member = Member {
            id: generate_member_id(),
            name: "Member One".to_string(),
            phone: None,
            discount_percent: percent,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.members().insert(&member).await.unwrap();
        member
    }

    async fn seed_product(
        db: &Database,
        price: i64,
        stock: i64,
        tiers: &[PriceTier],
    ) -> Product {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            sku: format!("SKU-{}", Uuid::new_v4()),
            name: "Beras 5kg".to_string(),
            base_price_cents: price,
            current_stock: stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        if !tiers.is_empty() {
            db.products().set_tiers(&product.id, tiers).await.unwrap();
        }
        product
    }

    fn request(lines: Vec<SettleLine>, tendered: i64) -> SettleRequest {
        SettleRequest {
            lines,
            member_id: None,
            additional_discount_cents: 0,
            payment_method: PaymentMethod::Cash,
            tendered_cents: tendered,
            cashier_id: "cashier-01".to_string(),
            attendant_id: None,
            note: None,
        }
    }

    fn line(product: &Product, quantity: i64) -> SettleLine {
        SettleLine {
            product_id: product.id.clone(),
            quantity,
            note: None,
        }
    }

    #[tokio::test]
    async fn test_exact_tender_is_paid_with_zero_change() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db, 10_000, 20, &[]).await;

        let receipt = db
            .settlement()
            .settle(request(vec![line(&product, 2)], 20_000))
            .await
            .unwrap();

        assert_eq!(receipt.outcome, SettlementOutcome::Paid);
        assert_eq!(receipt.change_cents, 0);
        assert_eq!(receipt.sale.status, SaleStatus::Paid);
        assert!(receipt.receivable.is_none());

        // Stock moved and the lines persisted.
        let stocked = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stocked.current_stock, 18);
        let lines = db.sales().get_lines(&receipt.sale.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_subtotal_cents, 20_000);
    }

    #[tokio::test]
    async fn test_overpayment_returns_change() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db, 7_500, 20, &[]).await;

        let receipt = db
            .settlement()
            .settle(request(vec![line(&product, 1)], 10_000))
            .await
            .unwrap();

        assert_eq!(receipt.outcome, SettlementOutcome::Paid);
        assert_eq!(receipt.change_cents, 2_500);
    }

    #[tokio::test]
    async fn test_one_cent_short_becomes_receivable_for_full_total() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let member = seed_member(&db, 0).await;
        let product = seed_product(&db, 10_000, 20, &[]).await;

        let mut req = request(vec![line(&product, 1)], 9_999);
        req.member_id = Some(member.id.clone());

        let receipt = db.settlement().settle(req).await.unwrap();

        assert_eq!(receipt.outcome, SettlementOutcome::Receivable);
        assert_eq!(receipt.change_cents, 0);
        assert_eq!(receipt.sale.status, SaleStatus::Unpaid);

        let receivable = receipt.receivable.unwrap();
        assert_eq!(receivable.amount_due_cents, 10_000);
        assert_eq!(receivable.amount_paid_cents, 9_999);
        assert_eq!(receivable.status, ReceivableStatus::PartiallyPaid);
    }

    #[tokio::test]
    async fn test_zero_tender_opens_unpaid_receivable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let member = seed_member(&db, 0).await;
        let product = seed_product(&db, 10_000, 20, &[]).await;

        let mut req = request(vec![line(&product, 1)], 0);
        req.member_id = Some(member.id.clone());

        let receipt = db.settlement().settle(req).await.unwrap();

        let receivable = receipt.receivable.unwrap();
        assert_eq!(receivable.status, ReceivableStatus::Unpaid);
        assert_eq!(receivable.amount_paid_cents, 0);
        // No opening ledger entry for a zero tender.
        assert!(db
            .receivables()
            .payments(&receivable.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_walk_in_cannot_carry_debt() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db, 10_000, 20, &[]).await;

        let err = db
            .settlement()
            .settle(request(vec![line(&product, 1)], 5_000))
            .await;

        assert!(matches!(
            err,
            Err(DbError::Domain(CoreError::ReceivableRequiresMember))
        ));

        // The refusal rolled everything back.
        let stocked = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stocked.current_stock, 20);
    }

    #[tokio::test]
    async fn test_insufficient_stock_aborts_whole_settlement() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let plenty = seed_product(&db, 1_000, 50, &[]).await;
        let scarce = seed_product(&db, 2_000, 3, &[]).await;

        let err = db
            .settlement()
            .settle(request(vec![line(&plenty, 5), line(&scarce, 5)], 100_000))
            .await;

        match err {
            Err(DbError::Domain(CoreError::InsufficientStock {
                available,
                requested,
                ..
            })) => {
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("expected insufficient stock, got {:?}", other),
        }

        // The first line's decrement rolled back with everything else.
        let p = db.products().get_by_id(&plenty.id).await.unwrap().unwrap();
        assert_eq!(p.current_stock, 50);
        let s = db.products().get_by_id(&scarce.id).await.unwrap().unwrap();
        assert_eq!(s.current_stock, 3);
    }

    #[tokio::test]
    async fn test_discount_stack_end_to_end() {
        // Tiers 1 -> 10000, 3 -> 9000; qty 5; member 5%; extra 2000.
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let member = seed_member(&db, 5).await;
        let product = seed_product(
            &db,
            10_000,
            50,
            &[PriceTier::new(1, 10_000), PriceTier::new(3, 9_000)],
        )
        .await;

        let mut req = request(vec![line(&product, 5)], 40_750);
        req.member_id = Some(member.id.clone());
        req.additional_discount_cents = 2_000;

        let receipt = db.settlement().settle(req).await.unwrap();

        assert_eq!(receipt.calculation.subtotal_cents, 45_000);
        assert_eq!(receipt.calculation.item_discount_cents, 5_000);
        assert_eq!(receipt.calculation.member_discount_cents, 2_250);
        assert_eq!(receipt.sale.total_cents, 40_750);
        assert_eq!(receipt.outcome, SettlementOutcome::Paid);
        assert_eq!(receipt.change_cents, 0);

        // The persisted line froze both price points.
        assert_eq!(receipt.lines[0].base_price_cents, 10_000);
        assert_eq!(receipt.lines[0].unit_price_cents, 9_000);
        assert_eq!(receipt.lines[0].item_discount_cents, 5_000);
    }

    #[tokio::test]
    async fn test_preview_matches_settlement_totals() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let member = seed_member(&db, 5).await;
        let tiers = vec![PriceTier::new(1, 10_000), PriceTier::new(3, 9_000)];
        let product = seed_product(&db, 10_000, 50, &tiers).await;

        let cart_line = CartLine::from_product(&product, tiers, 5);
        let preview = db
            .settlement()
            .preview(&[cart_line], Some(&member.id), 2_000)
            .await
            .unwrap();

        let mut req = request(vec![line(&product, 5)], 50_000);
        req.member_id = Some(member.id.clone());
        req.additional_discount_cents = 2_000;
        let receipt = db.settlement().settle(req).await.unwrap();

        assert_eq!(preview.total_cents, receipt.sale.total_cents);
        assert_eq!(preview.member_discount_cents, receipt.sale.member_discount_cents);
        assert_eq!(preview.item_discount_cents, receipt.sale.item_discount_cents);
    }

    #[tokio::test]
    async fn test_oversized_additional_discount_clamps_and_settles() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db, 1_000, 20, &[]).await;

        let mut req = request(vec![line(&product, 2)], 0);
        req.additional_discount_cents = 99_999;

        let receipt = db.settlement().settle(req).await.unwrap();

        // Clamped to the subtotal: total zero, zero tender covers it.
        assert_eq!(receipt.calculation.additional_discount_cents, 2_000);
        assert!(receipt.calculation.additional_discount_clamped);
        assert_eq!(receipt.sale.total_cents, 0);
        assert_eq!(receipt.outcome, SettlementOutcome::Paid);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.settlement().settle(request(vec![], 1_000)).await;
        assert!(matches!(
            err,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .settlement()
            .settle(request(
                vec![SettleLine {
                    product_id: "ghost".to_string(),
                    quantity: 1,
                    note: None,
                }],
                1_000,
            ))
            .await;
        assert!(matches!(
            err,
            Err(DbError::Domain(CoreError::ProductNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_unknown_member_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db, 1_000, 20, &[]).await;

        let mut req = request(vec![line(&product, 1)], 1_000);
        req.member_id = Some("ghost".to_string());

        let err = db.settlement().settle(req).await;
        assert!(matches!(
            err,
            Err(DbError::Domain(CoreError::MemberNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_negative_tender_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db, 1_000, 20, &[]).await;

        let err = db
            .settlement()
            .settle(request(vec![line(&product, 1)], -5))
            .await;
        assert!(matches!(
            err,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_attendant_hand_off_recorded_on_sale() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = seed_product(&db, 1_000, 20, &[]).await;

        let mut req = request(vec![line(&product, 1)], 1_000);
        req.attendant_id = Some("attendant-07".to_string());

        let receipt = db.settlement().settle(req).await.unwrap();
        assert_eq!(receipt.sale.attendant_id.as_deref(), Some("attendant-07"));
    }
}
