//! # Mapping Repository
//!
//! Remembered column mappings, one row per header signature.
//!
//! The mapping itself is stored as JSON, e.g.
//! `{"sku":0,"size":null,"price":2,"discount":null,"sales":4}`.

use sqlx::SqlitePool;
use tracing::debug;

use arb_core::{ColumnMapping, RememberedMapping};

use crate::error::DbResult;

#[derive(Debug, sqlx::FromRow)]
struct MappingRow {
    signature: String,
    mapping: String,
    label: String,
}

impl MappingRow {
    fn into_remembered(self) -> DbResult<RememberedMapping> {
        let mapping: ColumnMapping = serde_json::from_str(&self.mapping)?;
        Ok(RememberedMapping {
            signature: self.signature,
            mapping,
            label: self.label,
        })
    }
}

/// Repository for remembered mappings.
#[derive(Debug, Clone)]
pub struct MappingRepository {
    pool: SqlitePool,
}

impl MappingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MappingRepository { pool }
    }

    /// Inserts or overwrites the mapping for a signature.
    pub async fn upsert(&self, entry: &RememberedMapping) -> DbResult<()> {
        let json = serde_json::to_string(&entry.mapping)?;

        sqlx::query(
            r#"
            INSERT INTO column_mappings (signature, mapping, label, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(signature) DO UPDATE SET
                mapping = excluded.mapping,
                label = excluded.label,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&entry.signature)
        .bind(json)
        .bind(&entry.label)
        .execute(&self.pool)
        .await?;

        debug!(signature = %entry.signature, "Stored column mapping");
        Ok(())
    }

    /// Every remembered mapping, sorted by signature.
    pub async fn list(&self) -> DbResult<Vec<RememberedMapping>> {
        let rows = sqlx::query_as::<_, MappingRow>(
            "SELECT signature, mapping, label FROM column_mappings ORDER BY signature",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MappingRow::into_remembered).collect()
    }

    /// Forgets one signature. Returns whether it existed.
    pub async fn delete(&self, signature: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM column_mappings WHERE signature = ?1")
            .bind(signature)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Forgets every mapping.
    pub async fn clear(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM column_mappings")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use arb_core::ColumnRole;

    fn entry(signature: &str, price: usize, label: &str) -> RememberedMapping {
        RememberedMapping {
            signature: signature.to_string(),
            mapping: ColumnMapping::default()
                .with(ColumnRole::Sku, 0)
                .with(ColumnRole::Price, price),
            label: label.to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.mappings();

        repo.upsert(&entry("货号|价格|备注", 1, "a.xlsx")).await.unwrap();
        repo.upsert(&entry("货号|价格|备注", 2, "b.xlsx")).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all, vec![entry("货号|价格|备注", 2, "b.xlsx")]);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.mappings();
        repo.upsert(&entry("a", 1, "a")).await.unwrap();
        repo.upsert(&entry("b", 1, "b")).await.unwrap();

        assert!(repo.delete("a").await.unwrap());
        assert!(!repo.delete("a").await.unwrap());
        assert_eq!(repo.clear().await.unwrap(), 1);
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_json_is_reported() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query("INSERT INTO column_mappings (signature, mapping) VALUES ('x', '{oops')")
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.mappings().list().await.unwrap_err();
        assert!(matches!(err, DbError::Serialization(_)));
    }
}
