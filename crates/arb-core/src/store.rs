//! # Record Store
//!
//! The accumulated record set plus the per-category channel lists.
//!
//! The store is an ordinary value owned by whoever drives the workbench
//! (the desk app keeps it behind a mutex). Records are never edited in
//! place: they arrive in bulk ([`RecordStore::replace`],
//! [`RecordStore::append`]) and leave in bulk ([`RecordStore::remove`],
//! [`RecordStore::clear`]).
//!
//! ## Lookups
//! ```text
//! RecordStore ──index()──► SkuIndex ──view("DD1391-100")──► SkuView
//!                                                             │
//!                              market_price() ◄───────────────┤
//!                              quantity(category) ◄───────────┤
//!                              sales_history() ◄──────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Category, DomainRecord, SalesHistoryEntry};

/// Record count for one (channel, category) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChannelSummary {
    pub channel: String,
    pub category: Category,
    pub records: usize,
}

/// Accumulated records and channel lists.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<DomainRecord>,
    channels: BTreeMap<Category, Vec<String>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps records loaded from persistence.
    pub fn from_records(records: Vec<DomainRecord>) -> Self {
        RecordStore {
            records,
            channels: BTreeMap::new(),
        }
    }

    pub fn records(&self) -> &[DomainRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // -------------------------------------------------------------------------
    // Bulk mutation
    // -------------------------------------------------------------------------

    /// Replaces every record of `channel` + `category` with `records`.
    ///
    /// Returns how many records were dropped.
    pub fn replace(
        &mut self,
        channel: &str,
        category: Category,
        records: Vec<DomainRecord>,
    ) -> usize {
        let removed = self.remove(channel, category);
        self.records.extend(records);
        removed
    }

    /// Adds records without touching existing ones (manual entry).
    pub fn append(&mut self, records: Vec<DomainRecord>) {
        self.records.extend(records);
    }

    /// Drops every record of `channel` + `category`. Returns the count.
    pub fn remove(&mut self, channel: &str, category: Category) -> usize {
        let before = self.records.len();
        self.records
            .retain(|r| !(r.channel == channel && r.category == category));
        before - self.records.len()
    }

    /// Drops every record. Channel lists are kept.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    // -------------------------------------------------------------------------
    // Channels
    // -------------------------------------------------------------------------

    /// Channel names configured for a category, in insertion order.
    pub fn channels(&self, category: Category) -> &[String] {
        self.channels
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Adds a channel name. Returns false if it was already listed.
    pub fn add_channel(&mut self, category: Category, name: &str) -> bool {
        let list = self.channels.entry(category).or_default();
        if list.iter().any(|c| c == name) {
            return false;
        }
        list.push(name.to_string());
        true
    }

    /// Removes a channel name together with its records for that category.
    ///
    /// Returns how many records were dropped.
    pub fn remove_channel(&mut self, category: Category, name: &str) -> usize {
        if let Some(list) = self.channels.get_mut(&category) {
            list.retain(|c| c != name);
        }
        self.remove(name, category)
    }

    /// Replaces a category's channel list (used when loading).
    pub fn set_channels(&mut self, category: Category, names: Vec<String>) {
        self.channels.insert(category, names);
    }

    /// Record counts per (channel, category), sorted by category then channel.
    pub fn summary(&self) -> Vec<ChannelSummary> {
        let mut counts: BTreeMap<(Category, &str), usize> = BTreeMap::new();
        for record in &self.records {
            *counts
                .entry((record.category, record.channel.as_str()))
                .or_default() += 1;
        }
        counts
            .into_iter()
            .map(|((category, channel), records)| ChannelSummary {
                channel: channel.to_string(),
                category,
                records,
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    /// Per-SKU index for repeated lookups.
    pub fn index(&self) -> SkuIndex<'_> {
        let mut by_sku: HashMap<&str, Vec<&DomainRecord>> = HashMap::new();
        for record in &self.records {
            by_sku.entry(record.sku.as_str()).or_default().push(record);
        }
        SkuIndex { by_sku }
    }

    /// Records of one SKU, in store order.
    pub fn view(&self, sku: &str) -> SkuView<'_> {
        SkuView {
            records: self.records.iter().filter(|r| r.sku == sku).collect(),
        }
    }

    /// Price of the first stored market quote for `sku`, zero if none.
    pub fn market_price(&self, sku: &str) -> Money {
        self.view(sku).market_price()
    }

    /// Sum of cleaned sales over records of `sku` in `category`.
    pub fn quantity(&self, sku: &str, category: Category) -> u64 {
        self.view(sku).quantity(category)
    }

    /// Deduplicated sales history for `sku`, most recent first.
    pub fn sales_history(&self, sku: &str) -> Vec<SalesHistoryEntry> {
        self.view(sku).sales_history()
    }
}

/// SKU → records, borrowed from a [`RecordStore`].
#[derive(Debug)]
pub struct SkuIndex<'a> {
    by_sku: HashMap<&'a str, Vec<&'a DomainRecord>>,
}

impl<'a> SkuIndex<'a> {
    pub fn view(&self, sku: &str) -> SkuView<'a> {
        SkuView {
            records: self.by_sku.get(sku).cloned().unwrap_or_default(),
        }
    }
}

/// Records of a single SKU, in store order.
#[derive(Debug)]
pub struct SkuView<'a> {
    records: Vec<&'a DomainRecord>,
}

impl<'a> SkuView<'a> {
    pub fn records(&self) -> &[&'a DomainRecord] {
        &self.records
    }

    /// First market quote wins; later uploads do not override it.
    pub fn market_price(&self) -> Money {
        self.records
            .iter()
            .find(|r| r.category == Category::MarketPrice)
            .map(|r| r.price)
            .unwrap_or_default()
    }

    pub fn quantity(&self, category: Category) -> u64 {
        self.records
            .iter()
            .filter(|r| r.category == category)
            .fold(0u64, |sum, r| sum.saturating_add(r.sales))
    }

    /// Sales observations from supplier and market sheets.
    ///
    /// Records with a positive count are grouped by (date, file, channel)
    /// keeping the largest count, then ordered by date, newest first.
    pub fn sales_history(&self) -> Vec<SalesHistoryEntry> {
        let mut peaks: BTreeMap<(chrono::NaiveDate, &str, &str), u64> = BTreeMap::new();
        for record in &self.records {
            if !record.category.feeds_sales_history() || record.sales == 0 {
                continue;
            }
            let key = (
                record.ingested_on,
                record.file_name.as_str(),
                record.channel.as_str(),
            );
            let peak = peaks.entry(key).or_insert(0);
            *peak = (*peak).max(record.sales);
        }

        let mut history: Vec<SalesHistoryEntry> = peaks
            .into_iter()
            .map(|((date, file, channel), quantity)| SalesHistoryEntry {
                date,
                file_name: file.to_string(),
                channel: channel.to_string(),
                quantity,
            })
            .collect();
        history.sort_by(|a, b| b.date.cmp(&a.date));
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DiscountFactor;
    use chrono::NaiveDate;

    fn record(
        sku: &str,
        channel: &str,
        category: Category,
        price: i64,
        sales: u64,
    ) -> DomainRecord {
        DomainRecord {
            sku: sku.to_string(),
            size: "-".to_string(),
            price: Money::from_cents(price),
            discount: DiscountFactor::default(),
            sales_raw: sales.to_string(),
            sales,
            channel: channel.to_string(),
            file_name: format!("{channel}.xlsx"),
            category,
            ingested_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    #[test]
    fn test_replace_only_touches_matching_pair() {
        let mut store = RecordStore::new();
        store.append(vec![
            record("A", "Poizon", Category::MarketPrice, 100, 0),
            record("B", "Poizon", Category::OwnedInventory, 0, 3),
            record("C", "StockX", Category::MarketPrice, 100, 0),
        ]);

        let removed = store.replace(
            "Poizon",
            Category::MarketPrice,
            vec![record("D", "Poizon", Category::MarketPrice, 200, 0)],
        );

        assert_eq!(removed, 1);
        let skus: Vec<_> = store.records().iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, vec!["B", "C", "D"]);
    }

    #[test]
    fn test_market_price_takes_first_quote() {
        let mut store = RecordStore::new();
        store.append(vec![
            record("A", "Poizon", Category::MarketPrice, 200_000, 0),
            record("A", "StockX", Category::MarketPrice, 250_000, 0),
        ]);
        assert_eq!(store.market_price("A"), Money::from_cents(200_000));
        assert_eq!(store.market_price("Z"), Money::zero());
    }

    #[test]
    fn test_quantity_sums_by_category() {
        let mut store = RecordStore::new();
        store.append(vec![
            record("A", "Warehouse", Category::OwnedInventory, 0, 3),
            record("A", "Shop", Category::OwnedInventory, 0, 4),
            record("A", "Port", Category::InTransitFutures, 0, 10),
        ]);
        assert_eq!(store.quantity("A", Category::OwnedInventory), 7);
        assert_eq!(store.quantity("A", Category::InTransitFutures), 10);
        assert_eq!(store.quantity("A", Category::MarketPrice), 0);
    }

    #[test]
    fn test_sales_history_dedupes_and_orders() {
        let mut older = record("A", "Poizon", Category::MarketPrice, 100, 40);
        older.ingested_on = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut store = RecordStore::new();
        store.append(vec![
            older,
            record("A", "Poizon", Category::MarketPrice, 100, 20),
            record("A", "Poizon", Category::MarketPrice, 100, 90),
            record("A", "Outlet", Category::SupplierDiscount, 0, 0),
            record("A", "Warehouse", Category::OwnedInventory, 0, 500),
        ]);

        let history = store.sales_history("A");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].quantity, 90);
        assert_eq!(history[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(history[1].quantity, 40);
    }

    #[test]
    fn test_index_matches_direct_lookup() {
        let mut store = RecordStore::new();
        store.append(vec![
            record("A", "Poizon", Category::MarketPrice, 100, 5),
            record("B", "Poizon", Category::MarketPrice, 300, 0),
        ]);
        let index = store.index();
        assert_eq!(index.view("B").market_price(), store.market_price("B"));
        assert_eq!(index.view("A").sales_history(), store.sales_history("A"));
        assert!(index.view("Z").records().is_empty());
    }

    #[test]
    fn test_channels_and_summary() {
        let mut store = RecordStore::new();
        assert!(store.add_channel(Category::MarketPrice, "Poizon"));
        assert!(!store.add_channel(Category::MarketPrice, "Poizon"));
        store.append(vec![
            record("A", "Poizon", Category::MarketPrice, 100, 0),
            record("B", "Poizon", Category::MarketPrice, 100, 0),
            record("A", "Outlet", Category::SupplierDiscount, 0, 0),
        ]);

        let summary = store.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].channel, "Poizon");
        assert_eq!(summary[0].records, 2);

        assert_eq!(store.remove_channel(Category::MarketPrice, "Poizon"), 2);
        assert!(store.channels(Category::MarketPrice).is_empty());
        assert_eq!(store.len(), 1);

        store.clear();
        assert!(store.is_empty());
    }
}
