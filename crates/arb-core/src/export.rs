//! # Export
//!
//! Flattens ranked results into a table whose trailing columns depend on
//! the sales observations actually present.
//!
//! ## Two Phases
//! ```text
//! Phase 1: collect keys                  Phase 2: materialize rows
//! ─────────────────────                  ─────────────────────────
//! every history entry of every result    fixed columns
//!   → (date, channel, file)                + one cell per key:
//!   → deduplicate                            quantity, or blank
//!   → sort ascending by date
//! ```
//!
//! The table serializes to JSON either as `{columns, rows}` or, through
//! [`ExportTable::to_objects`], as one object per row keyed by column name.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::types::ArbitrageResult;

/// Fixed leading columns, in order.
pub const FIXED_COLUMNS: [&str; 12] = [
    "SKU",
    "Tag Price",
    "Discount",
    "Cost",
    "Market Price",
    "Net Revenue",
    "Profit",
    "ROI",
    "Source",
    "Source File",
    "Inventory",
    "Futures",
];

/// One exported value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExportCell {
    Number(f64),
    Text(String),
    Blank,
}

impl From<&ExportCell> for Value {
    fn from(cell: &ExportCell) -> Self {
        match cell {
            ExportCell::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ExportCell::Text(s) => Value::String(s.clone()),
            ExportCell::Blank => Value::Null,
        }
    }
}

/// A dynamic column: one distinct sales observation.
///
/// Field order gives the sort: date, then channel, then file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct HistoryKey {
    pub date: NaiveDate,
    pub channel: String,
    pub file_name: String,
}

impl HistoryKey {
    /// Column header, e.g. `2024-03-01 Poizon (feb.xlsx)`.
    pub fn label(&self) -> String {
        format!("{} {} ({})", self.date, self.channel, self.file_name)
    }
}

/// A flattened result list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ExportCell>>,
}

impl ExportTable {
    /// Builds the table. Row order follows `results`.
    pub fn from_results(results: &[ArbitrageResult]) -> Self {
        let keys: Vec<HistoryKey> = results
            .iter()
            .flat_map(|r| r.sales_history.iter())
            .map(|entry| HistoryKey {
                date: entry.date,
                channel: entry.channel.clone(),
                file_name: entry.file_name.clone(),
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut columns: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(keys.iter().map(HistoryKey::label));

        let rows = results
            .iter()
            .map(|result| {
                let mut row = fixed_cells(result);
                row.extend(keys.iter().map(|key| {
                    result
                        .sales_history
                        .iter()
                        .find(|e| {
                            e.date == key.date
                                && e.channel == key.channel
                                && e.file_name == key.file_name
                        })
                        .map(|e| ExportCell::Number(e.quantity as f64))
                        .unwrap_or(ExportCell::Blank)
                }));
                row
            })
            .collect();

        ExportTable { columns, rows }
    }

    /// One JSON object per row, keyed by column name.
    pub fn to_objects(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let object: Map<String, Value> = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().map(Value::from))
                    .collect();
                Value::Object(object)
            })
            .collect()
    }

    /// Index of a column by name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

fn fixed_cells(r: &ArbitrageResult) -> Vec<ExportCell> {
    vec![
        ExportCell::Text(r.sku.clone()),
        ExportCell::Number(r.tag_price.amount()),
        ExportCell::Number(r.discount.value()),
        ExportCell::Number(r.cost_price.amount()),
        ExportCell::Number(r.market_price.amount()),
        ExportCell::Number(r.net_revenue.amount()),
        ExportCell::Number(r.profit.amount()),
        ExportCell::Number(r.roi),
        ExportCell::Text(r.source_label.clone()),
        ExportCell::Text(r.source_file.clone()),
        ExportCell::Number(r.inventory_qty as f64),
        ExportCell::Number(r.futures_qty as f64),
    ]
}
