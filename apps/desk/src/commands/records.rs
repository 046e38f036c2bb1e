//! # Record Commands
//!
//! Manual entry, channel lists, clearing and status.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use arb_core::validation::validate_channel_name;
use arb_core::{enter_manual, Category, ChannelSummary, ManualEntry, RecordStore, RowProblem};

use crate::error::{ApiError, ApiResult};
use crate::state::{DbState, WorkbenchState};

// =============================================================================
// Manual Entry
// =============================================================================

/// Outcome of a manual entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManualReport {
    pub added: usize,
    pub problems: Vec<RowProblem>,
}

/// Appends hand-typed records to a channel.
///
/// Entries go through the same row checks as uploaded sheets; rejected
/// rows come back as problems and are not stored.
pub async fn add_manual_entries(
    db: &DbState,
    workbench: &WorkbenchState,
    channel: &str,
    category: Category,
    ingested_on: NaiveDate,
    entries: &[ManualEntry],
) -> ApiResult<ManualReport> {
    let channel = channel.trim();
    let mut staged = RecordStore::new();
    let extraction = enter_manual(&mut staged, entries, channel, category, ingested_on)?;

    if !extraction.records.is_empty() {
        db.inner().records().append(&extraction.records).await?;
        db.inner().channels().add(category, channel).await?;

        workbench.with_workbench_mut(|w| {
            w.store.append(extraction.records.clone());
            w.store.add_channel(category, channel);
        });
    }

    Ok(ManualReport {
        added: extraction.records.len(),
        problems: extraction.problems,
    })
}

// =============================================================================
// Channels
// =============================================================================

/// One channel with its stored record count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelListing {
    pub name: String,
    pub records: usize,
}

/// Channel lists per category, optionally for one category only.
pub fn list_channels(
    workbench: &WorkbenchState,
    category: Option<Category>,
) -> BTreeMap<Category, Vec<ChannelListing>> {
    workbench.with_workbench(|w| {
        let summary = w.store.summary();
        let counts: BTreeMap<(Category, &str), usize> = summary
            .iter()
            .map(|s| ((s.category, s.channel.as_str()), s.records))
            .collect();

        Category::ALL
            .iter()
            .copied()
            .filter(|c| category.map_or(true, |wanted| wanted == *c))
            .map(|c| {
                let listings = w
                    .store
                    .channels(c)
                    .iter()
                    .map(|name| ChannelListing {
                        name: name.clone(),
                        records: counts.get(&(c, name.as_str())).copied().unwrap_or(0),
                    })
                    .collect();
                (c, listings)
            })
            .collect()
    })
}

/// Adds a channel name to a category. Returns false if it was listed.
pub async fn add_channel(
    db: &DbState,
    workbench: &WorkbenchState,
    category: Category,
    name: &str,
) -> ApiResult<bool> {
    validate_channel_name(name).map_err(|e| ApiError::validation(e.to_string()))?;
    let name = name.trim();

    let listed = workbench.with_workbench(|w| w.store.channels(category).iter().any(|c| c == name));
    if listed {
        return Ok(false);
    }

    db.inner().channels().add(category, name).await?;
    Ok(workbench.with_workbench_mut(|w| w.store.add_channel(category, name)))
}

/// Removes a channel and every record it holds in that category.
///
/// Returns how many records were dropped.
pub async fn remove_channel(
    db: &DbState,
    workbench: &WorkbenchState,
    category: Category,
    name: &str,
) -> ApiResult<usize> {
    let name = name.trim();
    let listed = workbench.with_workbench(|w| w.store.channels(category).iter().any(|c| c == name));
    if !listed {
        return Err(ApiError::not_found("Channel", name));
    }

    db.inner().channels().remove(category, name).await?;
    db.inner().records().remove(name, category).await?;
    let removed = workbench.with_workbench_mut(|w| w.store.remove_channel(category, name));

    info!(category = %category, channel = %name, removed, "channel removed");
    Ok(removed)
}

// =============================================================================
// Clear & Status
// =============================================================================

/// Drops every stored record. Channel lists and mappings survive.
pub async fn clear_records(db: &DbState, workbench: &WorkbenchState) -> ApiResult<usize> {
    db.inner().records().clear().await?;
    let removed = workbench.with_workbench_mut(|w| {
        let count = w.store.len();
        w.store.clear();
        count
    });

    info!(removed, "all records cleared");
    Ok(removed)
}

/// Snapshot of what the desk holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub records: usize,
    pub mappings: usize,
    pub channels: Vec<ChannelSummary>,
    pub migrations_applied: usize,
    pub migrations_total: usize,
    pub database_ok: bool,
}

pub async fn status(db: &DbState, workbench: &WorkbenchState) -> ApiResult<StatusReport> {
    let (records, mappings, channels) =
        workbench.with_workbench(|w| (w.store.len(), w.memory.len(), w.store.summary()));
    let (migrations_total, migrations_applied) = db.inner().migration_status().await?;

    Ok(StatusReport {
        records,
        mappings,
        channels,
        migrations_applied,
        migrations_total,
        database_ok: db.inner().health_check().await,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::Desk;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn entry(sku: &str, price: f64, sales: &str) -> ManualEntry {
        ManualEntry {
            sku: sku.into(),
            price: Some(price),
            sales: Some(sales.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_manual_entry_appends_and_reports_problems() {
        let desk = Desk::in_memory().await.unwrap();

        let report = add_manual_entries(
            &desk.db,
            &desk.workbench,
            "Poizon",
            Category::MarketPrice,
            date(),
            &[entry("DD1391-100", 1299.0, "3000+"), entry("DZ5485-612", -5.0, "1")],
        )
        .await
        .unwrap();

        assert_eq!(report.added, 1);
        assert_eq!(report.problems.len(), 1);
        assert_eq!(report.problems[0].row, 3);

        let reloaded = desk.db.inner().load_store().await.unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.records()[0].file_name, "manual entry");
        assert_eq!(reloaded.channels(Category::MarketPrice), ["Poizon".to_string()]);
    }

    #[tokio::test]
    async fn test_manual_entry_rejects_blank_channel() {
        let desk = Desk::in_memory().await.unwrap();
        let err = add_manual_entries(
            &desk.db,
            &desk.workbench,
            "  ",
            Category::MarketPrice,
            date(),
            &[entry("A", 1.0, "1")],
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_channel_lifecycle() {
        let desk = Desk::in_memory().await.unwrap();

        let warehouse = Category::OwnedInventory;
        assert!(add_channel(&desk.db, &desk.workbench, warehouse, "Warehouse")
            .await
            .unwrap());
        assert!(!add_channel(&desk.db, &desk.workbench, warehouse, "Warehouse")
            .await
            .unwrap());
        add_manual_entries(
            &desk.db,
            &desk.workbench,
            "Warehouse",
            Category::OwnedInventory,
            date(),
            &[entry("A1", 0.0, "4"), entry("B2", 0.0, "2")],
        )
        .await
        .unwrap();

        let listed = list_channels(&desk.workbench, Some(Category::OwnedInventory));
        assert_eq!(listed.len(), 1);
        assert_eq!(
            listed[&Category::OwnedInventory],
            vec![ChannelListing { name: "Warehouse".into(), records: 2 }]
        );

        let removed = remove_channel(&desk.db, &desk.workbench, warehouse, "Warehouse")
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(desk.db.inner().records().count().await.unwrap(), 0);
        assert!(desk.db.inner().channels().list_all().await.unwrap().is_empty());

        let err = remove_channel(&desk.db, &desk.workbench, Category::OwnedInventory, "Warehouse")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_clear_keeps_channels() {
        let desk = Desk::in_memory().await.unwrap();
        add_manual_entries(
            &desk.db,
            &desk.workbench,
            "Poizon",
            Category::MarketPrice,
            date(),
            &[entry("A1", 10.0, "1")],
        )
        .await
        .unwrap();

        assert_eq!(clear_records(&desk.db, &desk.workbench).await.unwrap(), 1);

        let report = status(&desk.db, &desk.workbench).await.unwrap();
        assert_eq!(report.records, 0);
        assert!(report.database_ok);
        assert_eq!(report.migrations_applied, report.migrations_total);
        assert_eq!(
            desk.db.inner().channels().list(Category::MarketPrice).await.unwrap(),
            vec!["Poizon"]
        );
    }

    #[tokio::test]
    async fn test_failed_write_leaves_workbench_untouched() {
        let desk = Desk::in_memory().await.unwrap();
        desk.db.inner().close().await;

        let err = add_manual_entries(
            &desk.db,
            &desk.workbench,
            "Poizon",
            Category::MarketPrice,
            date(),
            &[entry("A1", 10.0, "1")],
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);

        let err = add_channel(&desk.db, &desk.workbench, Category::MarketPrice, "StockX")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);

        desk.workbench.with_workbench(|w| {
            assert!(w.store.is_empty());
            assert!(w.store.channels(Category::MarketPrice).is_empty());
        });
    }
}
