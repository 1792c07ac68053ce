//! # Receivable Ledger
//!
//! Owns the repayment lifecycle of receivables created by under-paid
//! settlements.
//!
//! ## Repayment State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  unpaid ──(payment, paid < due)──► partially_paid                      │
//! │     │                                    │                              │
//! │     │                                    │ (payment, paid == due)      │
//! │     │ (payment, paid == due)             ▼                              │
//! │     └───────────────────────────────► paid  (terminal)                 │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                            parent sale flips unpaid -> paid            │
//! │                            in the SAME transaction                     │
//! │                                                                         │
//! │  Transitions never go backward. amount_paid never exceeds              │
//! │  amount_due.                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Two cashiers can record payments against the same receivable at the
//! same moment. The balance read, the bound check and the write are ONE
//! guarded UPDATE, so a stale read can never slip an overpayment in
//! between: the second writer either re-evaluates against the committed
//! balance or loses the database race and surfaces
//! [`crate::error::DbError::ConcurrencyConflict`].

use chrono::Utc;
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use kasira_core::validation::validate_payment_amount;
use kasira_core::{CoreError, Money, PaymentMethod, Receivable, ReceivablePayment, ReceivableStatus};

// =============================================================================
// Query Types
// =============================================================================

/// Filter for the pending-receivables listing.
#[derive(Debug, Clone, Default)]
pub struct ReceivableFilter {
    /// Restrict to one status. When absent, everything still owing
    /// (unpaid and partially paid) is listed.
    pub status: Option<ReceivableStatus>,
    /// Restrict to one member.
    pub member_id: Option<String>,
    /// Case-insensitive substring match on member name or phone.
    pub search: Option<String>,
}

/// A page request, 1-based.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest { page: 1, limit: 20 }
    }
}

impl PageRequest {
    /// Page limits are clamped into [1, 100]; page floors at 1.
    fn normalized(&self) -> (u32, i64, i64) {
        let page = self.page.max(1);
        let limit = i64::from(self.limit.clamp(1, 100));
        let offset = (i64::from(page) - 1) * limit;
        (page, limit, offset)
    }
}

/// Pagination metadata returned with a listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_items: i64,
    pub total_pages: u32,
}

/// A receivable joined with the member that owes it (listing row).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReceivableWithMember {
    pub id: String,
    pub sale_id: String,
    pub member_id: String,
    pub member_name: String,
    pub member_phone: Option<String>,
    pub amount_due_cents: i64,
    pub amount_paid_cents: i64,
    pub status: ReceivableStatus,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

/// One page of pending receivables.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivablesPage {
    pub receivables: Vec<ReceivableWithMember>,
    pub pagination: Pagination,
}

/// The result of a successful ledger posting.
#[derive(Debug, Clone)]
pub struct AppliedPayment {
    /// The receivable after the payment.
    pub receivable: Receivable,
    /// The recorded history row.
    pub payment: ReceivablePayment,
    /// Outstanding balance after the payment.
    pub remaining_cents: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for receivables and their repayment ledger.
#[derive(Debug, Clone)]
pub struct ReceivableRepository {
    pool: SqlitePool,
}

impl ReceivableRepository {
    /// Creates a new ReceivableRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReceivableRepository { pool }
    }

    /// Gets a receivable by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Receivable>> {
        let receivable = sqlx::query_as::<_, Receivable>(
            r#"
            SELECT id, sale_id, member_id, amount_due_cents,
                   amount_paid_cents, status, created_at, updated_at
            FROM receivables
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(receivable)
    }

    /// Gets the receivable attached to a sale, if any.
    pub async fn get_by_sale(&self, sale_id: &str) -> DbResult<Option<Receivable>> {
        let receivable = sqlx::query_as::<_, Receivable>(
            r#"
            SELECT id, sale_id, member_id, amount_due_cents,
                   amount_paid_cents, status, created_at, updated_at
            FROM receivables
            WHERE sale_id = ?1
            "#,
        )
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(receivable)
    }

    /// Records a repayment against a receivable.
    ///
    /// ## Rules
    /// - `amount` must be positive
    /// - `amount` must not exceed the outstanding balance; the rejection
    ///   names the largest acceptable amount
    /// - a fully repaid receivable accepts nothing further
    ///
    /// ## Atomicity
    /// The balance check and the balance write are one conditional
    /// UPDATE. When it matches no row, the failure is diagnosed from the
    /// current row and NOTHING was written. When it succeeds, the
    /// history row, the new status, and (on full repayment) the parent
    /// sale's status flip all commit together.
    pub async fn apply_payment(
        &self,
        receivable_id: &str,
        amount: Money,
        method: PaymentMethod,
    ) -> DbResult<AppliedPayment> {
        validate_payment_amount(amount.cents()).map_err(CoreError::from)?;

        debug!(receivable_id = %receivable_id, amount = %amount, "Applying receivable payment");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Read-check-write as a single statement. The status CASE mirrors
        // ReceivableStatus::for_amounts: amount is positive, so the
        // result is either partially_paid or paid.
        let result = sqlx::query(
            r#"
            UPDATE receivables
            SET amount_paid_cents = amount_paid_cents + ?2,
                status = CASE
                    WHEN amount_paid_cents + ?2 >= amount_due_cents THEN 'paid'
                    ELSE 'partially_paid'
                END,
                updated_at = ?3
            WHERE id = ?1
              AND status <> 'paid'
              AND amount_paid_cents + ?2 <= amount_due_cents
            "#,
        )
        .bind(receivable_id)
        .bind(amount.cents())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // The guard refused; find out why. The open transaction is
            // dropped un-committed, so nothing persists.
            let current = sqlx::query_as::<_, Receivable>(
                r#"
                SELECT id, sale_id, member_id, amount_due_cents,
                       amount_paid_cents, status, created_at, updated_at
                FROM receivables
                WHERE id = ?1
                "#,
            )
            .bind(receivable_id)
            .fetch_optional(&mut *tx)
            .await?;

            return Err(match current {
                None => CoreError::ReceivableNotFound(receivable_id.to_string()).into(),
                Some(r) if r.status.is_terminal() => {
                    CoreError::ReceivableAlreadySettled(r.id).into()
                }
                Some(r) => CoreError::PaymentExceedsBalance {
                    remaining: r.remaining(),
                }
                .into(),
            });
        }

        let payment = ReceivablePayment {
            id: Uuid::new_v4().to_string(),
            receivable_id: receivable_id.to_string(),
            method,
            amount_cents: amount.cents(),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO receivable_payments (
                id, receivable_id, method, amount_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.receivable_id)
        .bind(payment.method)
        .bind(payment.amount_cents)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, Receivable>(
            r#"
            SELECT id, sale_id, member_id, amount_due_cents,
                   amount_paid_cents, status, created_at, updated_at
            FROM receivables
            WHERE id = ?1
            "#,
        )
        .bind(receivable_id)
        .fetch_one(&mut *tx)
        .await?;

        // Full repayment closes the originating sale in the same commit.
        if updated.status.is_terminal() {
            sqlx::query(
                r#"
                UPDATE sales
                SET status = 'paid', updated_at = ?2
                WHERE id = ?1 AND status = 'unpaid'
                "#,
            )
            .bind(&updated.sale_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let remaining = updated.remaining().cents();
        info!(
            receivable_id = %receivable_id,
            amount = %amount,
            remaining = %remaining,
            status = ?updated.status,
            "Receivable payment recorded"
        );

        Ok(AppliedPayment {
            receivable: updated,
            payment,
            remaining_cents: remaining,
        })
    }

    /// Gets the repayment history of a receivable, oldest first.
    pub async fn payments(&self, receivable_id: &str) -> DbResult<Vec<ReceivablePayment>> {
        let payments = sqlx::query_as::<_, ReceivablePayment>(
            r#"
            SELECT id, receivable_id, method, amount_cents, created_at
            FROM receivable_payments
            WHERE receivable_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(receivable_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Lists receivables still owing, newest first, joined with member
    /// identity.
    ///
    /// With no status filter, fully repaid receivables are excluded;
    /// passing an explicit status (including paid) overrides that.
    pub async fn list_pending(
        &self,
        filter: &ReceivableFilter,
        page: PageRequest,
    ) -> DbResult<ReceivablesPage> {
        let (page_num, limit, offset) = page.normalized();

        let mut count_query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT COUNT(*) FROM receivables r \
             INNER JOIN members m ON m.id = r.member_id WHERE 1 = 1",
        );
        push_filter(&mut count_query, filter);
        let total_items: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut list_query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT r.id, r.sale_id, r.member_id, m.name AS member_name, \
             m.phone AS member_phone, r.amount_due_cents, \
             r.amount_paid_cents, r.status, r.created_at, r.updated_at \
             FROM receivables r \
             INNER JOIN members m ON m.id = r.member_id WHERE 1 = 1",
        );
        push_filter(&mut list_query, filter);
        list_query.push(" ORDER BY r.created_at DESC LIMIT ");
        list_query.push_bind(limit);
        list_query.push(" OFFSET ");
        list_query.push_bind(offset);

        let receivables = list_query
            .build_query_as::<ReceivableWithMember>()
            .fetch_all(&self.pool)
            .await?;

        let total_pages = ((total_items + limit - 1) / limit).max(1) as u32;

        Ok(ReceivablesPage {
            receivables,
            pagination: Pagination {
                page: page_num,
                limit: limit as u32,
                total_items,
                total_pages,
            },
        })
    }
}

/// Appends the WHERE conditions shared by the count and list queries.
fn push_filter(query: &mut QueryBuilder<Sqlite>, filter: &ReceivableFilter) {
    match filter.status {
        Some(status) => {
            query.push(" AND r.status = ");
            query.push_bind(status);
        }
        None => {
            query.push(" AND r.status <> 'paid'");
        }
    }

    if let Some(member_id) = &filter.member_id {
        query.push(" AND r.member_id = ");
        query.push_bind(member_id.clone());
    }

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search.trim());
        query.push(" AND (m.name LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR m.phone LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
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
    use crate::settlement::{SettleLine, SettleRequest};
    use crate::DbError;
    use kasira_core::{Member, Product, SaleStatus, SettlementOutcome};

    async fn seed_member(db: &Database, name: &str, percent: u32) -> Member {
        let now = Utc::now();
        let member = Member {
            id: generate_member_id(),
            name: name.to_string(),
            phone: Some("0812-555-0001".to_string()),
            discount_percent: percent,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.members().insert(&member).await.unwrap();
        member
    }

    async fn seed_product(db: &Database, sku: &str, price: i64, stock: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            sku: sku.to_string(),
            name: format!("Product {}", sku),
            base_price_cents: price,
            current_stock: stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product
    }

    /// Settles a 10_000 sale for `member` with `tendered` upfront and
    /// returns the resulting receivable.
    async fn seed_receivable(db: &Database, member: &Member, tendered: i64) -> Receivable {
        let product = seed_product(db, &format!("SKU-{}", Uuid::new_v4()), 10_000, 50).await;
        let receipt = db
            .settlement()
            .settle(SettleRequest {
                lines: vec![SettleLine {
                    product_id: product.id.clone(),
                    quantity: 1,
                    note: None,
                }],
                member_id: Some(member.id.clone()),
                additional_discount_cents: 0,
                payment_method: PaymentMethod::Cash,
                tendered_cents: tendered,
                cashier_id: "cashier-01".to_string(),
                attendant_id: None,
                note: None,
            })
            .await
            .unwrap();

        assert_eq!(receipt.outcome, SettlementOutcome::Receivable);
        receipt.receivable.unwrap()
    }

    #[tokio::test]
    async fn test_lifecycle_unpaid_partial_paid() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let member = seed_member(&db, "Budi", 0).await;
        let receivable = seed_receivable(&db, &member, 0).await;

        assert_eq!(receivable.status, ReceivableStatus::Unpaid);
        assert_eq!(receivable.amount_due_cents, 10_000);
        assert_eq!(receivable.amount_paid_cents, 0);

        let ledger = db.receivables();

        let first = ledger
            .apply_payment(&receivable.id, Money::from_cents(4_000), PaymentMethod::Cash)
            .await
            .unwrap();
        assert_eq!(first.receivable.status, ReceivableStatus::PartiallyPaid);
        assert_eq!(first.remaining_cents, 6_000);

        // The sale is still open while the balance is outstanding.
        let sale = db
            .sales()
            .get_by_id(&receivable.sale_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sale.status, SaleStatus::Unpaid);

        let second = ledger
            .apply_payment(&receivable.id, Money::from_cents(6_000), PaymentMethod::Cash)
            .await
            .unwrap();
        assert_eq!(second.receivable.status, ReceivableStatus::Paid);
        assert_eq!(second.remaining_cents, 0);

        // Full repayment flipped the sale in the same commit.
        let sale = db
            .sales()
            .get_by_id(&receivable.sale_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sale.status, SaleStatus::Paid);
    }

    #[tokio::test]
    async fn test_overpayment_rejected_and_state_unchanged() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let member = seed_member(&db, "Budi", 0).await;
        let receivable = seed_receivable(&db, &member, 0).await;

        let ledger = db.receivables();
        ledger
            .apply_payment(&receivable.id, Money::from_cents(9_500), PaymentMethod::Cash)
            .await
            .unwrap();

        let err = ledger
            .apply_payment(&receivable.id, Money::from_cents(501), PaymentMethod::Cash)
            .await;
        match err {
            Err(DbError::Domain(CoreError::PaymentExceedsBalance { remaining })) => {
                assert_eq!(remaining.cents(), 500);
            }
            other => panic!("expected overpayment rejection, got {:?}", other),
        }

        // Nothing moved.
        let current = ledger.get_by_id(&receivable.id).await.unwrap().unwrap();
        assert_eq!(current.amount_paid_cents, 9_500);
        assert_eq!(current.status, ReceivableStatus::PartiallyPaid);
        assert_eq!(ledger.payments(&receivable.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_positive_amounts_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let member = seed_member(&db, "Budi", 0).await;
        let receivable = seed_receivable(&db, &member, 0).await;

        let ledger = db.receivables();
        for amount in [0, -100] {
            let err = ledger
                .apply_payment(&receivable.id, Money::from_cents(amount), PaymentMethod::Cash)
                .await;
            assert!(matches!(
                err,
                Err(DbError::Domain(CoreError::Validation(_)))
            ));
        }
    }

    #[tokio::test]
    async fn test_terminal_receivable_accepts_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let member = seed_member(&db, "Budi", 0).await;
        let receivable = seed_receivable(&db, &member, 0).await;

        let ledger = db.receivables();
        ledger
            .apply_payment(&receivable.id, Money::from_cents(10_000), PaymentMethod::Cash)
            .await
            .unwrap();

        let err = ledger
            .apply_payment(&receivable.id, Money::from_cents(1), PaymentMethod::Cash)
            .await;
        assert!(matches!(
            err,
            Err(DbError::Domain(CoreError::ReceivableAlreadySettled(_)))
        ));
    }

    #[tokio::test]
    async fn test_unknown_receivable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .receivables()
            .apply_payment("ghost", Money::from_cents(100), PaymentMethod::Cash)
            .await;
        assert!(matches!(
            err,
            Err(DbError::Domain(CoreError::ReceivableNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_history_sums_to_amount_paid() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let member = seed_member(&db, "Budi", 0).await;
        // Partial tender at settlement opens the history.
        let receivable = seed_receivable(&db, &member, 2_500).await;
        assert_eq!(receivable.amount_paid_cents, 2_500);

        let ledger = db.receivables();
        ledger
            .apply_payment(&receivable.id, Money::from_cents(1_500), PaymentMethod::Transfer)
            .await
            .unwrap();

        let current = ledger.get_by_id(&receivable.id).await.unwrap().unwrap();
        let history = ledger.payments(&receivable.id).await.unwrap();
        let history_total: i64 = history.iter().map(|p| p.amount_cents).sum();
        assert_eq!(history_total, current.amount_paid_cents);
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_list_pending_filters_and_paginates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let budi = seed_member(&db, "Budi Santoso", 0).await;
        let sari = seed_member(&db, "Sari Dewi", 0).await;

        let r1 = seed_receivable(&db, &budi, 0).await;
        let _r2 = seed_receivable(&db, &sari, 2_000).await;
        let r3 = seed_receivable(&db, &sari, 0).await;

        let ledger = db.receivables();

        // Fully repay one; it drops out of the default listing.
        ledger
            .apply_payment(&r3.id, Money::from_cents(10_000), PaymentMethod::Cash)
            .await
            .unwrap();

        let page = ledger
            .list_pending(&ReceivableFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.pagination.total_items, 2);
        assert!(page.receivables.iter().all(|r| r.status != ReceivableStatus::Paid));

        // Status filter.
        let partial = ledger
            .list_pending(
                &ReceivableFilter {
                    status: Some(ReceivableStatus::PartiallyPaid),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(partial.pagination.total_items, 1);

        // Member filter.
        let by_member = ledger
            .list_pending(
                &ReceivableFilter {
                    member_id: Some(budi.id.clone()),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_member.pagination.total_items, 1);
        assert_eq!(by_member.receivables[0].id, r1.id);

        // Name search.
        let by_name = ledger
            .list_pending(
                &ReceivableFilter {
                    search: Some("sari".to_string()),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_name.pagination.total_items, 1);
        assert_eq!(by_name.receivables[0].member_name, "Sari Dewi");

        // Pagination math.
        let tiny = ledger
            .list_pending(
                &ReceivableFilter::default(),
                PageRequest { page: 1, limit: 1 },
            )
            .await
            .unwrap();
        assert_eq!(tiny.receivables.len(), 1);
        assert_eq!(tiny.pagination.total_pages, 2);
    }
}
