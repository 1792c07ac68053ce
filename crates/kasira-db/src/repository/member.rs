//! # Member Repository
//!
//! Database operations for registered members. The engine reads members
//! for two things: the discount percentage at composition time and the
//! identity a receivable attaches to. Membership management beyond that
//! is the surrounding application's concern.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use kasira_core::validation::validate_discount_percent;
use kasira_core::Member;

/// Repository for member database operations.
#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    /// Creates a new MemberRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MemberRepository { pool }
    }

    /// Inserts a new member.
    pub async fn insert(&self, member: &Member) -> DbResult<()> {
        validate_discount_percent(member.discount_percent)
            .map_err(kasira_core::CoreError::from)?;

        debug!(id = %member.id, "Inserting member");

        sqlx::query(
            r#"
            INSERT INTO members (
                id, name, phone, discount_percent, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&member.id)
        .bind(&member.name)
        .bind(&member.phone)
        .bind(member.discount_percent)
        .bind(member.is_active)
        .bind(member.created_at)
        .bind(member.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a member by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, name, phone, discount_percent, is_active,
                   created_at, updated_at
            FROM members
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }
}

/// Helper to generate a new member ID.
pub fn generate_member_id() -> String {
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
    use chrono::Utc;
    use kasira_core::CoreError;

    fn sample_member(percent: u32) -> Member {
        let now = Utc::now();
        Member {
            id: generate_member_id(),
            name: "Siti Rahma".to_string(),
            phone: Some("0812-0000-0000".to_string()),
            discount_percent: percent,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_member() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.members();

        let member = sample_member(5);
        repo.insert(&member).await.unwrap();

        let fetched = repo.get_by_id(&member.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Siti Rahma");
        assert_eq!(fetched.discount_percent, 5);
    }

    #[tokio::test]
    async fn test_insert_rejects_percent_over_100() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.members().insert(&sample_member(101)).await;
        assert!(matches!(
            err,
            Err(DbError::Domain(CoreError::Validation(_)))
        ));
    }
}
