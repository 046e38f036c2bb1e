//! # Record Repository
//!
//! Stored domain records.
//!
//! Records are never updated row by row; they are replaced or removed in
//! bulk per (channel, category), mirroring `RecordStore`.

use chrono::NaiveDate;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use arb_core::{Category, DiscountFactor, DomainRecord, Money};

use crate::error::DbResult;

/// Row shape of the `records` table.
#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    sku: String,
    size: String,
    price_cents: i64,
    discount_hundredths: i64,
    sales_raw: String,
    sales: i64,
    channel: String,
    file_name: String,
    category: Category,
    ingested_on: NaiveDate,
}

impl From<RecordRow> for DomainRecord {
    fn from(row: RecordRow) -> Self {
        DomainRecord {
            sku: row.sku,
            size: row.size,
            price: Money::from_cents(row.price_cents),
            discount: DiscountFactor::from_hundredths(
                u32::try_from(row.discount_hundredths)
                    .unwrap_or(DiscountFactor::FULL_PRICE_HUNDREDTHS),
            ),
            sales_raw: row.sales_raw,
            sales: u64::try_from(row.sales).unwrap_or(0),
            channel: row.channel,
            file_name: row.file_name,
            category: row.category,
            ingested_on: row.ingested_on,
        }
    }
}

/// Repository for record operations.
#[derive(Debug, Clone)]
pub struct RecordRepository {
    pool: SqlitePool,
}

impl RecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RecordRepository { pool }
    }

    /// Every record, in insertion order.
    ///
    /// Order matters: the matcher takes the first market quote per SKU.
    pub async fn list_all(&self) -> DbResult<Vec<DomainRecord>> {
        let rows = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT sku, size, price_cents, discount_hundredths, sales_raw, sales,
                   channel, file_name, category, ingested_on
            FROM records
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded records");
        Ok(rows.into_iter().map(DomainRecord::from).collect())
    }

    /// Replaces every record of `channel` + `category` in one transaction.
    ///
    /// Returns how many stored records were dropped.
    pub async fn replace(
        &self,
        channel: &str,
        category: Category,
        records: &[DomainRecord],
    ) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM records WHERE channel = ?1 AND category = ?2")
            .bind(channel)
            .bind(category)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        insert_all(&mut tx, records).await?;
        tx.commit().await?;

        debug!(
            channel = %channel,
            category = %category,
            removed,
            inserted = records.len(),
            "Replaced records"
        );
        Ok(removed)
    }

    /// Adds records without touching existing ones.
    pub async fn append(&self, records: &[DomainRecord]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_all(&mut tx, records).await?;
        tx.commit().await?;

        debug!(inserted = records.len(), "Appended records");
        Ok(())
    }

    /// Drops every record of `channel` + `category`.
    pub async fn remove(&self, channel: &str, category: Category) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM records WHERE channel = ?1 AND category = ?2")
            .bind(channel)
            .bind(category)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Drops every record.
    pub async fn clear(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM records")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

async fn insert_all(tx: &mut Transaction<'_, Sqlite>, records: &[DomainRecord]) -> DbResult<()> {
    for record in records {
        sqlx::query(
            r#"
            INSERT INTO records (
                id, sku, size, price_cents, discount_hundredths, sales_raw, sales,
                channel, file_name, category, ingested_on
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&record.sku)
        .bind(&record.size)
        .bind(record.price.cents())
        .bind(i64::from(record.discount.hundredths()))
        .bind(&record.sales_raw)
        .bind(i64::try_from(record.sales).unwrap_or(i64::MAX))
        .bind(&record.channel)
        .bind(&record.file_name)
        .bind(record.category)
        .bind(record.ingested_on)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
