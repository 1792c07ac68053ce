//! # Suspended Sale Repository
//!
//! The attendant hand-off: a cart assembled on the floor is parked here
//! and later claimed by a cashier, who resumes it into a live cart and
//! settles it through the ordinary path.
//!
//! ## Hand-off Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Attendant cart ──suspend()──► suspended_sales row (lines as JSON)      │
//! │                                     │                                   │
//! │                    cashier ──claim()┘ guarded open -> claimed           │
//! │                                     │                                   │
//! │                                     ▼                                   │
//! │                      Cart::from_lines(...) ──► settle as usual          │
//! │                                                                         │
//! │  Two cashiers racing for the same cart: exactly one claim wins;        │
//! │  the other sees SuspendedSaleNotAvailable.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use kasira_core::validation::{validate_note, validate_required_id};
use kasira_core::{CartLine, CoreError};

/// Lifecycle of a parked cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SuspendedSaleStatus {
    /// Waiting for a cashier.
    Open,
    /// Taken over by a cashier. Terminal; the cart lives on at the till.
    Claimed,
}

/// A parked cart.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SuspendedSale {
    pub id: String,
    pub attendant_id: String,
    pub member_id: Option<String>,
    /// The cart lines, serialized. Use [`SuspendedSale::lines`].
    pub lines_json: String,
    pub note: Option<String>,
    pub status: SuspendedSaleStatus,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SuspendedSale {
    /// Deserializes the parked cart lines.
    pub fn lines(&self) -> DbResult<Vec<CartLine>> {
        Ok(serde_json::from_str(&self.lines_json)?)
    }
}

/// Repository for suspended sales.
#[derive(Debug, Clone)]
pub struct SuspendedSaleRepository {
    pool: SqlitePool,
}

impl SuspendedSaleRepository {
    /// Creates a new SuspendedSaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SuspendedSaleRepository { pool }
    }

    /// Parks a cart for later settlement.
    pub async fn suspend(
        &self,
        attendant_id: &str,
        member_id: Option<&str>,
        lines: &[CartLine],
        note: Option<&str>,
    ) -> DbResult<SuspendedSale> {
        validate_required_id("attendant_id", attendant_id).map_err(CoreError::from)?;
        validate_note(note).map_err(CoreError::from)?;
        if lines.is_empty() {
            return Err(CoreError::Validation(
                kasira_core::ValidationError::Required {
                    field: "lines".to_string(),
                },
            )
            .into());
        }

        let suspended = SuspendedSale {
            id: Uuid::new_v4().to_string(),
            attendant_id: attendant_id.to_string(),
            member_id: member_id.map(str::to_string),
            lines_json: serde_json::to_string(lines)?,
            note: note.map(str::to_string),
            status: SuspendedSaleStatus::Open,
            claimed_by: None,
            claimed_at: None,
            created_at: Utc::now(),
        };

        debug!(id = %suspended.id, attendant = %attendant_id, lines = lines.len(), "Suspending sale");

        sqlx::query(
            r#"
            INSERT INTO suspended_sales (
                id, attendant_id, member_id, lines_json, note,
                status, claimed_by, claimed_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&suspended.id)
        .bind(&suspended.attendant_id)
        .bind(&suspended.member_id)
        .bind(&suspended.lines_json)
        .bind(&suspended.note)
        .bind(suspended.status)
        .bind(&suspended.claimed_by)
        .bind(suspended.claimed_at)
        .bind(suspended.created_at)
        .execute(&self.pool)
        .await?;

        Ok(suspended)
    }

    /// Claims a parked cart for a cashier.
    ///
    /// The open -> claimed transition is a guarded UPDATE: exactly one
    /// of two racing cashiers gets the cart.
    ///
    /// ## Returns
    /// The claimed record and its deserialized lines, ready for
    /// `Cart::from_lines`.
    pub async fn claim(
        &self,
        id: &str,
        cashier_id: &str,
    ) -> DbResult<(SuspendedSale, Vec<CartLine>)> {
        validate_required_id("cashier_id", cashier_id).map_err(CoreError::from)?;

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE suspended_sales
            SET status = 'claimed', claimed_by = ?2, claimed_at = ?3
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(id)
        .bind(cashier_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::SuspendedSaleNotAvailable(id.to_string()).into());
        }

        let suspended = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::SuspendedSaleNotAvailable(id.to_string()))?;
        let lines = suspended.lines()?;

        info!(id = %id, cashier = %cashier_id, "Suspended sale claimed");

        Ok((suspended, lines))
    }

    /// Gets a suspended sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SuspendedSale>> {
        let suspended = sqlx::query_as::<_, SuspendedSale>(
            r#"
            SELECT id, attendant_id, member_id, lines_json, note,
                   status, claimed_by, claimed_at, created_at
            FROM suspended_sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(suspended)
    }

    /// Lists carts still waiting for a cashier, oldest first.
    pub async fn list_open(&self, limit: u32) -> DbResult<Vec<SuspendedSale>> {
        let open = sqlx::query_as::<_, SuspendedSale>(
            r#"
            SELECT id, attendant_id, member_id, lines_json, note,
                   status, claimed_by, claimed_at, created_at
            FROM suspended_sales
            WHERE status = 'open'
            ORDER BY created_at
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(open)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
