//! # Sale Repository
//!
//! Read access to settled sales and their line items.
//!
//! Sales are written exactly once, inside the settlement transaction
//! (see [`crate::settlement`]); the only later mutation is the
//! `unpaid -> paid` flip driven by the receivable ledger. This
//! repository therefore exposes reads only.

use sqlx::SqlitePool;

use crate::error::DbResult;
use kasira_core::{Sale, SaleLine};

/// A sale joined with its immutable line items, as shown on a receipt.
#[derive(Debug, Clone)]
pub struct SaleWithLines {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

/// Repository for sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, receipt_number, status, member_id, cashier_id,
                   attendant_id, subtotal_cents, item_discount_cents,
                   member_discount_cents, additional_discount_cents,
                   tax_cents, total_cents, payment_method, tendered_cents,
                   change_cents, note, created_at, updated_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all line items for a sale.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT id, sale_id, product_id, name_snapshot,
                   base_price_cents, unit_price_cents, quantity,
                   item_discount_cents, line_subtotal_cents, note,
                   created_at
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Gets a sale with its lines, or None when the sale is unknown.
    pub async fn get_with_lines(&self, id: &str) -> DbResult<Option<SaleWithLines>> {
        let Some(sale) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let lines = self.get_lines(id).await?;
        Ok(Some(SaleWithLines { sale, lines }))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};

    // Behavior around created sales is exercised end-to-end in the
    // settlement tests; here we only pin the empty cases.

    #[tokio::test]
    async fn test_unknown_sale_is_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.sales().get_by_id("ghost").await.unwrap().is_none());
        assert!(db.sales().get_with_lines("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lines_of_unknown_sale_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.sales().get_lines("ghost").await.unwrap().is_empty());
    }
}
