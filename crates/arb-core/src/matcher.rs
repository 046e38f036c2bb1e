//! # Arbitrage Matcher
//!
//! Prices every candidate on a purchase list against the record store.
//!
//! ## Per-Row Computation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  purchase row: DD1391-100 | tag ¥1000 | discount 3.6                    │
//! │                                                                         │
//! │  cost     = tag × discount / 10            = ¥360                       │
//! │  market   = first stored market quote      = ¥2000   (0 ⇒ unmatched)    │
//! │  net      = market − platform fee (12%)    = ¥1760                      │
//! │  profit   = net − cost                     = ¥1400   (unmatched: −cost) │
//! │  roi      = profit / cost                  = 3.889   (unmatched: 0)     │
//! │                                                                         │
//! │  history  = row's own sales figure, if any                              │
//! │             else supplier + market sales from the store                 │
//! │  volume   = peak quantity in the history                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The row's own discount always wins over anything stored; a missing or
//! unreadable discount means full price.
//!
//! ## Post-pass
//! One result per SKU (highest profit wins, earlier row on a tie), then a
//! stable sort by profit, highest first.

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::header::read_header;
use crate::mapping::{ColumnMapping, ColumnRole, KeywordTable};
use crate::memory::MappingMemory;
use crate::money::Money;
use crate::normalize::{
    extract_sales_count, normalize_product_code, parse_amount, parse_discount_factor,
};
use crate::sheet::Sheet;
use crate::store::{RecordStore, SkuView};
use crate::types::{ArbitrageResult, Category, DiscountFactor, FeeRate, SalesHistoryEntry};

/// Channel name used for sales figures read off the purchase list itself.
pub const PURCHASE_LIST_CHANNEL: &str = "purchase list";

/// Source label when no sales figure exists anywhere.
pub const NO_DATA_LABEL: &str = "no data";

/// Knobs for one matching run.
#[derive(Debug, Clone)]
pub struct MatcherOptions {
    /// Date stamped on sales figures taken from the purchase list.
    pub today: NaiveDate,
    pub fee: FeeRate,
    pub keywords: KeywordTable,
}

impl MatcherOptions {
    pub fn new(today: NaiveDate) -> Self {
        MatcherOptions {
            today,
            fee: FeeRate::default(),
            keywords: KeywordTable::default(),
        }
    }

    pub fn with_fee(mut self, fee: FeeRate) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_keywords(mut self, keywords: KeywordTable) -> Self {
        self.keywords = keywords;
        self
    }
}

/// Computes one ranked result per SKU on the purchase list.
///
/// A remembered mapping for the purchase list's header takes precedence
/// over the keyword guess.
///
/// ## Errors
/// - `CoreError::EmptySheet` when the sheet has no rows
/// - `CoreError::MissingColumns` when SKU or tag price cannot be located
pub fn match_purchase_list(
    sheet: &Sheet,
    file_name: &str,
    store: &RecordStore,
    memory: &MappingMemory,
    options: &MatcherOptions,
) -> CoreResult<Vec<ArbitrageResult>> {
    if sheet.is_empty() {
        return Err(CoreError::EmptySheet {
            file: file_name.to_string(),
        });
    }

    let header = read_header(sheet, &options.keywords);
    let mapping = memory
        .lookup(&header.signature)
        .copied()
        .unwrap_or_else(|| ColumnMapping::guess(&header.cells, &options.keywords));

    let sku_col = match mapping.sku {
        Some(col) if mapping.price.is_some() => col,
        _ => {
            return Err(CoreError::MissingColumns {
                file: file_name.to_string(),
                missing: [ColumnRole::Sku, ColumnRole::Price]
                    .into_iter()
                    .filter(|role| mapping.get(*role).is_none())
                    .collect(),
            })
        }
    };

    let index = store.index();
    let mut results = Vec::new();

    for row in (header.index + 1)..sheet.len() {
        if sheet.is_row_blank(row) {
            continue;
        }
        let sku = normalize_product_code(sheet.cell(row, sku_col));
        if sku.is_empty() {
            continue;
        }
        let view = index.view(&sku);
        results.push(price_row(sheet, row, &mapping, file_name, sku, &view, options));
    }

    let candidates = results.len();
    let ranked = keep_best_per_sku(results);

    info!(
        file = %file_name,
        candidates,
        results = ranked.len(),
        matched = ranked.iter().filter(|r| r.is_matched()).count(),
        "matched purchase list"
    );
    Ok(ranked)
}

fn price_row(
    sheet: &Sheet,
    row: usize,
    mapping: &ColumnMapping,
    file_name: &str,
    sku: String,
    view: &SkuView<'_>,
    options: &MatcherOptions,
) -> ArbitrageResult {
    let cell = |role: ColumnRole| {
        mapping
            .get(role)
            .map(|col| sheet.cell(row, col))
            .filter(|c| !c.is_blank())
    };

    let tag_price = cell(ColumnRole::Price)
        .and_then(parse_amount)
        .filter(|amount| *amount >= 0.0)
        .map(Money::from_amount)
        .unwrap_or_default();

    let discount = cell(ColumnRole::Discount)
        .map(parse_discount_factor)
        .unwrap_or_else(DiscountFactor::full_price);

    let cost_price = tag_price.apply_discount(discount);
    let market_price = view.market_price();
    let matched = market_price.is_positive();

    let net_revenue = if matched {
        market_price.net_of_fee(options.fee)
    } else {
        Money::zero()
    };
    let profit = if matched {
        net_revenue - cost_price
    } else {
        -cost_price
    };
    let roi = if matched && cost_price.is_positive() {
        profit.ratio_to(cost_price)
    } else {
        0.0
    };

    let (sales_history, source_label, source_file) = match cell(ColumnRole::Sales) {
        Some(sales) => (
            vec![SalesHistoryEntry {
                date: options.today,
                file_name: file_name.to_string(),
                channel: PURCHASE_LIST_CHANNEL.to_string(),
                quantity: extract_sales_count(sales),
            }],
            PURCHASE_LIST_CHANNEL.to_string(),
            file_name.to_string(),
        ),
        None => {
            let history = view.sales_history();
            let (label, file) = match peak_entry(&history) {
                Some(peak) => (peak.channel.clone(), peak.file_name.clone()),
                None => (NO_DATA_LABEL.to_string(), file_name.to_string()),
            };
            (history, label, file)
        }
    };
    let sales_volume = sales_history.iter().map(|e| e.quantity).max().unwrap_or(0);

    debug!(sku = %sku, row = row + 1, matched, profit = profit.cents(), "priced candidate");

    ArbitrageResult {
        sku,
        size: cell(ColumnRole::Size)
            .map(|c| c.text())
            .unwrap_or_else(|| "-".to_string()),
        tag_price,
        discount,
        cost_price,
        market_price,
        net_revenue,
        profit,
        roi,
        source_label,
        source_file,
        inventory_qty: view.quantity(Category::OwnedInventory),
        futures_qty: view.quantity(Category::InTransitFutures),
        sales_volume,
        sales_history,
    }
}

/// The most recent entry carrying the peak quantity.
fn peak_entry(history: &[SalesHistoryEntry]) -> Option<&SalesHistoryEntry> {
    // max_by_key keeps the last maximum; history is newest first
    history.iter().rev().max_by_key(|entry| entry.quantity)
}

fn keep_best_per_sku(results: Vec<ArbitrageResult>) -> Vec<ArbitrageResult> {
    let mut slot: HashMap<String, usize> = HashMap::new();
    let mut best: Vec<ArbitrageResult> = Vec::with_capacity(results.len());

    for result in results {
        match slot.get(&result.sku) {
            Some(&i) => {
                if result.profit > best[i].profit {
                    best[i] = result;
                }
            }
            None => {
                slot.insert(result.sku.clone(), best.len());
                best.push(result);
            }
        }
    }

    best.sort_by(|a, b| b.profit.cmp(&a.profit));
    best
}

// =============================================================================
// Unit Tests
// =============================================================================
