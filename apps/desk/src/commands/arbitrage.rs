//! # Arbitrage Commands
//!
//! Matches a purchase list against the stored records and exports the
//! ranked results.

use chrono::NaiveDate;
use std::path::Path;
use tracing::info;

use arb_core::{match_purchase_list, ArbitrageResult, ExportTable, MatcherOptions};

use crate::error::ApiResult;
use crate::sheets::NamedSheet;
use crate::state::{DeskConfig, WorkbenchState};

/// Ranked results for one purchase list, best profit first.
pub fn match_sheet(
    workbench: &WorkbenchState,
    config: &DeskConfig,
    purchase_list: &NamedSheet,
    today: NaiveDate,
) -> ApiResult<Vec<ArbitrageResult>> {
    let options = MatcherOptions::new(today)
        .with_fee(config.fee())
        .with_keywords(config.keywords.clone());

    let results = workbench.with_workbench(|w| {
        match_purchase_list(
            &purchase_list.sheet,
            &purchase_list.name,
            &w.store,
            &w.memory,
            &options,
        )
    })?;
    Ok(results)
}

/// Writes the flattened export table as a JSON array of row objects.
///
/// Returns the number of rows written.
pub async fn export_results(results: &[ArbitrageResult], path: &Path) -> ApiResult<usize> {
    let table = ExportTable::from_results(results);
    let json = serde_json::to_string_pretty(&table.to_objects())?;
    tokio::fs::write(path, json).await?;

    info!(
        path = %path.display(),
        rows = table.rows.len(),
        columns = table.columns.len(),
        "results exported"
    );
    Ok(table.rows.len())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::{Workbench, WorkbenchState};
    use arb_core::{
        Category, Cell, DiscountFactor, DomainRecord, MappingMemory, Money, RecordStore, Sheet,
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn record(sku: &str, category: Category, price_cents: i64, sales: u64) -> DomainRecord {
        DomainRecord {
            sku: sku.into(),
            size: "-".into(),
            price: Money::from_cents(price_cents),
            discount: DiscountFactor::full_price(),
            sales_raw: sales.to_string(),
            sales,
            channel: "Poizon".into(),
            file_name: "feb.json".into(),
            category,
            ingested_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    fn workbench() -> WorkbenchState {
        let store = RecordStore::from_records(vec![
            record("DD1391-100", Category::MarketPrice, 129_900, 120),
            record("DZ5485-612", Category::MarketPrice, 50_000, 0),
        ]);
        WorkbenchState::new(Workbench::new(store, MappingMemory::new()))
    }

    fn purchase_list() -> NamedSheet {
        NamedSheet::new(
            "list.json",
            Sheet::new(vec![
                vec![Cell::from("货号"), Cell::from("吊牌价"), Cell::from("折扣")],
                vec![Cell::from("DZ5485-612"), Cell::from(899.0), Cell::from(5.0)],
                vec![Cell::from("dd1391-100"), Cell::from(699.0), Cell::from(3.6)],
            ]),
        )
    }

    #[test]
    fn test_match_ranks_by_profit() {
        let results =
            match_sheet(&workbench(), &DeskConfig::default(), &purchase_list(), today()).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].sku, "DD1391-100");
        // cost 699 * 0.36 = 251.64; net 1299 * 0.88 = 1143.12
        assert_eq!(results[0].cost_price.cents(), 25_164);
        assert_eq!(results[0].net_revenue.cents(), 114_312);
        assert_eq!(results[0].profit.cents(), 89_148);
    }

    #[test]
    fn test_fee_comes_from_config() {
        let mut config = DeskConfig::default();
        config.matching.fee_bps = 0;

        let results = match_sheet(&workbench(), &config, &purchase_list(), today()).unwrap();
        assert_eq!(results[0].net_revenue.cents(), 129_900);
    }

    #[test]
    fn test_purchase_list_without_price_column() {
        let list = NamedSheet::new(
            "bad.json",
            Sheet::new(vec![
                vec![Cell::from("货号"), Cell::from("备注")],
                vec![Cell::from("DD1391-100"), Cell::from("x")],
            ]),
        );

        let err = match_sheet(&workbench(), &DeskConfig::default(), &list, today()).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingColumns);
    }

    #[tokio::test]
    async fn test_export_writes_row_objects() {
        let results =
            match_sheet(&workbench(), &DeskConfig::default(), &purchase_list(), today()).unwrap();
        let path =
            std::env::temp_dir().join(format!("arb-desk-{}-export.json", std::process::id()));

        let written = export_results(&results, &path).await.unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(written, 2);
        let rows: Vec<serde_json::Value> = serde_json::from_str(&contents).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["SKU"], "DD1391-100");
        assert_eq!(rows[0]["Source"], "Poizon");

        // Fixed columns lead, in table order, followed by the dated column
        let keys: Vec<&str> = rows[0].as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(&keys[..12], &arb_core::export::FIXED_COLUMNS[..]);
        assert_eq!(keys[12..], ["2024-03-01 Poizon (feb.json)"]);

        let sku = contents.find("\"SKU\"").unwrap();
        let futures = contents.find("\"Futures\"").unwrap();
        let dated = contents.find("\"2024-03-01 Poizon").unwrap();
        assert!(sku < futures && futures < dated);
    }
}
