//! # Product Repository
//!
//! Database operations for products and their price tiers.
//!
//! The settlement engine needs only a narrow slice of catalog
//! management: create, fetch with tiers, and adjust stock. Full catalog
//! CRUD lives with the surrounding application, not here.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use kasira_core::{CoreError, PriceTier, Product};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.get_by_id("uuid-here").await?;
/// let tiers = repo.get_tiers("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, base_price_cents, current_stock,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.base_price_cents)
        .bind(product.current_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, base_price_cents, current_stock,
                   is_active, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, base_price_cents, current_stock,
                   is_active, created_at, updated_at
            FROM products
            WHERE sku = ?1
            "#,
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets the price tiers for a product, ordered by threshold.
    ///
    /// An empty result is normal: the product then sells at its base
    /// price for every quantity.
    pub async fn get_tiers(&self, product_id: &str) -> DbResult<Vec<PriceTier>> {
        let tiers = sqlx::query_as::<_, PriceTier>(
            r#"
            SELECT min_qty, price_cents
            FROM price_tiers
            WHERE product_id = ?1
            ORDER BY min_qty
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tiers)
    }

    /// Replaces a product's tier table.
    ///
    /// The table is swapped atomically so a concurrent settlement reads
    /// either the old tiers or the new ones, never a mix.
    pub async fn set_tiers(&self, product_id: &str, tiers: &[PriceTier]) -> DbResult<()> {
        debug!(product_id = %product_id, count = tiers.len(), "Replacing price tiers");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM price_tiers WHERE product_id = ?1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        for tier in tiers {
            sqlx::query(
                r#"
                INSERT INTO price_tiers (id, product_id, min_qty, price_cents)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(product_id)
            .bind(tier.min_qty)
            .bind(tier.price_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Adds stock to a product (goods received, returns).
    ///
    /// ## Delta Pattern
    /// Stock changes are always relative (`current_stock + delta`), never
    /// absolute, so two terminals adjusting the same product do not
    /// overwrite each other.
    pub async fn restock(&self, id: &str, quantity: i64) -> DbResult<()> {
        debug!(id = %id, quantity = %quantity, "Restocking product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET current_stock = current_stock + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        Ok(())
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::DbError;

    fn sample_product(sku: &str, price: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            sku: sku.to_string(),
            name: format!("Product {}", sku),
            base_price_cents: price,
            current_stock: stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let product = sample_product("RICE-5KG", 10_000, 40);
        repo.insert(&product).await.unwrap();

        let fetched = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.sku, "RICE-5KG");
        assert_eq!(fetched.base_price_cents, 10_000);
        assert_eq!(fetched.current_stock, 40);

        let by_sku = repo.get_by_sku("RICE-5KG").await.unwrap().unwrap();
        assert_eq!(by_sku.id, product.id);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&sample_product("DUP", 100, 1)).await.unwrap();
        let err = repo.insert(&sample_product("DUP", 200, 2)).await;

        assert!(matches!(err, Err(DbError::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn test_tier_roundtrip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let product = sample_product("TIERED", 1_100, 100);
        repo.insert(&product).await.unwrap();

        repo.set_tiers(
            &product.id,
            &[
                PriceTier::new(10, 800),
                PriceTier::new(1, 1000),
                PriceTier::new(5, 900),
            ],
        )
        .await
        .unwrap();

        let tiers = repo.get_tiers(&product.id).await.unwrap();
        assert_eq!(tiers.len(), 3);
        // Ordered by threshold regardless of insert order.
        assert_eq!(tiers[0], PriceTier::new(1, 1000));
        assert_eq!(tiers[2], PriceTier::new(10, 800));
    }

    #[tokio::test]
    async fn test_restock_adjusts_relative() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let product = sample_product("STOCK", 500, 10);
        repo.insert(&product).await.unwrap();

        repo.restock(&product.id, 15).await.unwrap();
        let fetched = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.current_stock, 25);
    }

    #[tokio::test]
    async fn test_restock_unknown_product() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.products().restock("ghost", 5).await;
        assert!(matches!(
            err,
            Err(DbError::Domain(CoreError::ProductNotFound(_)))
        ));
    }
}
