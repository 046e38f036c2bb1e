//! # Channel Repository
//!
//! Per-category channel lists, kept in the order they were added.

use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::debug;

use arb_core::Category;

use crate::error::DbResult;

/// Repository for channel list operations.
#[derive(Debug, Clone)]
pub struct ChannelRepository {
    pool: SqlitePool,
}

impl ChannelRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ChannelRepository { pool }
    }

    /// Channel names of one category, in insertion order.
    pub async fn list(&self, category: Category) -> DbResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM channels WHERE category = ?1 ORDER BY position, rowid",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    /// Every category's channel list.
    pub async fn list_all(&self) -> DbResult<BTreeMap<Category, Vec<String>>> {
        let rows: Vec<(Category, String)> =
            sqlx::query_as("SELECT category, name FROM channels ORDER BY position, rowid")
                .fetch_all(&self.pool)
                .await?;

        let mut lists: BTreeMap<Category, Vec<String>> = BTreeMap::new();
        for (category, name) in rows {
            lists.entry(category).or_default().push(name);
        }
        Ok(lists)
    }

    /// Adds a channel. Returns false when it already exists.
    pub async fn add(&self, category: Category, name: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO channels (category, name, position)
            VALUES (?1, ?2, (SELECT COALESCE(MAX(position), 0) + 1 FROM channels))
            "#,
        )
        .bind(category)
        .bind(name)
        .execute(&self.pool)
        .await?;

        let added = result.rows_affected() > 0;
        debug!(category = %category, name = %name, added, "Add channel");
        Ok(added)
    }

    /// Removes a channel name. Its records are removed separately.
    pub async fn remove(&self, category: Category, name: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM channels WHERE category = ?1 AND name = ?2")
            .bind(category)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_add_list_remove() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.channels();

        assert!(repo.add(Category::MarketPrice, "Poizon").await.unwrap());
        assert!(repo.add(Category::MarketPrice, "StockX").await.unwrap());
        assert!(!repo.add(Category::MarketPrice, "Poizon").await.unwrap());
        assert!(repo.add(Category::OwnedInventory, "Warehouse").await.unwrap());

        assert_eq!(repo.list(Category::MarketPrice).await.unwrap(), vec!["Poizon", "StockX"]);

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[&Category::OwnedInventory], vec!["Warehouse"]);

        assert!(repo.remove(Category::MarketPrice, "Poizon").await.unwrap());
        assert!(!repo.remove(Category::MarketPrice, "Poizon").await.unwrap());
        assert_eq!(repo.list(Category::MarketPrice).await.unwrap(), vec!["StockX"]);
    }
}
