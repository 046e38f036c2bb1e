//! # Column Mapping
//!
//! Guesses which column of a header row plays which role.
//!
//! ## Detection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Header: [ 序号 | 货号 | 尺码 | 得物价 | 月销量 ]                       │
//! │                                                                         │
//! │  role      synonyms (priority order)         first hit                  │
//! │  ───────   ──────────────────────────────    ─────────                  │
//! │  sku       货号, 款号, 商品编码, SKU, ...     col 1                      │
//! │  size      尺码, 码数, Size, ...              col 2                      │
//! │  price     吊牌价, 市场价, 得物价, 价格, ...   col 3                      │
//! │  discount  折扣, 折数, Discount, ...          absent                     │
//! │  sales     销量, 数量, 库存, Sales, ...       col 4                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Matching is a case-sensitive substring test on trimmed header text. The
//! synonym table is business vocabulary, so it lives in configuration
//! ([`KeywordTable`]) rather than in code.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::types::Category;

// =============================================================================
// Column Role
// =============================================================================

/// Semantic role a column can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Sku,
    Size,
    Price,
    Discount,
    Sales,
}

impl ColumnRole {
    /// All roles, in mapping order.
    pub const ALL: [ColumnRole; 5] = [
        ColumnRole::Sku,
        ColumnRole::Size,
        ColumnRole::Price,
        ColumnRole::Discount,
        ColumnRole::Sales,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::Sku => "sku",
            ColumnRole::Size => "size",
            ColumnRole::Price => "price",
            ColumnRole::Discount => "discount",
            ColumnRole::Sales => "sales",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Keyword Table
// =============================================================================

/// Ordered synonym lists per role.
///
/// Earlier synonyms win over later ones, so put the most specific label
/// first (e.g. "吊牌价" before "价格").
///
/// ## Config File Section
/// ```toml
/// [keywords]
/// sku = ["货号", "款号", "SKU"]
/// price = ["吊牌价", "价格", "Price"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordTable {
    #[serde(default = "default_sku_keywords")]
    pub sku: Vec<String>,

    #[serde(default = "default_size_keywords")]
    pub size: Vec<String>,

    #[serde(default = "default_price_keywords")]
    pub price: Vec<String>,

    #[serde(default = "default_discount_keywords")]
    pub discount: Vec<String>,

    #[serde(default = "default_sales_keywords")]
    pub sales: Vec<String>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn default_sku_keywords() -> Vec<String> {
    owned(&[
        "货号", "款号", "商品编码", "型号", "SKU", "Sku", "sku", "Style Code", "Product Code",
        "Article",
    ])
}

fn default_size_keywords() -> Vec<String> {
    owned(&["尺码", "码数", "鞋码", "Size", "size"])
}

fn default_price_keywords() -> Vec<String> {
    owned(&[
        "吊牌价", "市场价", "得物价", "价格", "售价", "单价", "Tag Price", "Price", "price",
    ])
}

fn default_discount_keywords() -> Vec<String> {
    owned(&["折扣", "折数", "Discount", "discount"])
}

fn default_sales_keywords() -> Vec<String> {
    owned(&[
        "销量", "月销", "数量", "库存", "件数", "Sales", "sales", "Qty", "qty", "Quantity",
    ])
}

impl Default for KeywordTable {
    fn default() -> Self {
        KeywordTable {
            sku: default_sku_keywords(),
            size: default_size_keywords(),
            price: default_price_keywords(),
            discount: default_discount_keywords(),
            sales: default_sales_keywords(),
        }
    }
}

impl KeywordTable {
    /// Synonyms for one role, in priority order.
    pub fn synonyms(&self, role: ColumnRole) -> &[String] {
        match role {
            ColumnRole::Sku => &self.sku,
            ColumnRole::Size => &self.size,
            ColumnRole::Price => &self.price,
            ColumnRole::Discount => &self.discount,
            ColumnRole::Sales => &self.sales,
        }
    }

    /// Lower-cased product-code synonyms, used to spot the header row.
    pub fn header_keywords(&self) -> Vec<String> {
        self.sku
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

// =============================================================================
// Column Mapping
// =============================================================================

/// Column index per role; `None` means the role is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ColumnMapping {
    pub sku: Option<usize>,
    pub size: Option<usize>,
    pub price: Option<usize>,
    pub discount: Option<usize>,
    pub sales: Option<usize>,
}

impl ColumnMapping {
    /// Guesses a mapping from trimmed header cells.
    ///
    /// For every role, synonyms are tried in priority order and the first
    /// header cell containing the synonym wins.
    ///
    /// ## Example
    /// ```rust
    /// use arb_core::mapping::{ColumnMapping, KeywordTable};
    ///
    /// let header: Vec<String> = ["序号", "货号", "尺码", "得物价", "月销量"]
    ///     .iter()
    ///     .map(|s| s.to_string())
    ///     .collect();
    /// let mapping = ColumnMapping::guess(&header, &KeywordTable::default());
    ///
    /// assert_eq!(mapping.sku, Some(1));
    /// assert_eq!(mapping.size, Some(2));
    /// assert_eq!(mapping.price, Some(3));
    /// assert_eq!(mapping.discount, None);
    /// assert_eq!(mapping.sales, Some(4));
    /// ```
    pub fn guess(header: &[String], keywords: &KeywordTable) -> Self {
        let mut mapping = ColumnMapping::default();
        for role in ColumnRole::ALL {
            let hit = keywords
                .synonyms(role)
                .iter()
                .filter(|synonym| !synonym.is_empty())
                .find_map(|synonym| {
                    header
                        .iter()
                        .position(|cell| cell.contains(synonym.as_str()))
                });
            mapping.set(role, hit);
        }
        mapping
    }

    /// Column for a role.
    pub fn get(&self, role: ColumnRole) -> Option<usize> {
        match role {
            ColumnRole::Sku => self.sku,
            ColumnRole::Size => self.size,
            ColumnRole::Price => self.price,
            ColumnRole::Discount => self.discount,
            ColumnRole::Sales => self.sales,
        }
    }

    /// Sets (or clears) the column for a role.
    pub fn set(&mut self, role: ColumnRole, column: Option<usize>) {
        match role {
            ColumnRole::Sku => self.sku = column,
            ColumnRole::Size => self.size = column,
            ColumnRole::Price => self.price = column,
            ColumnRole::Discount => self.discount = column,
            ColumnRole::Sales => self.sales = column,
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, role: ColumnRole, column: usize) -> Self {
        self.set(role, Some(column));
        self
    }

    /// Roles that must be mapped before a sheet of `category` can be
    /// imported without asking the user.
    ///
    /// ## Policy
    /// - always: sku
    /// - market-price: price
    /// - owned-inventory / in-transit-futures: sales
    pub fn missing_for(&self, category: Category) -> Vec<ColumnRole> {
        let mut required = vec![ColumnRole::Sku];
        if category == Category::MarketPrice {
            required.push(ColumnRole::Price);
        }
        if category.is_position() {
            required.push(ColumnRole::Sales);
        }
        required
            .into_iter()
            .filter(|role| self.get(*role).is_none())
            .collect()
    }

    /// Whether the guess is complete enough to auto-accept.
    pub fn is_complete_for(&self, category: Category) -> bool {
        self.missing_for(category).is_empty()
    }

    /// Largest mapped column index, if any role is mapped.
    pub fn max_column(&self) -> Option<usize> {
        ColumnRole::ALL.iter().filter_map(|r| self.get(*r)).max()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_guess_english_header() {
        let mapping = ColumnMapping::guess(
            &header(&["Style Code", "Size", "Price", "Discount", "Sales"]),
            &KeywordTable::default(),
        );
        assert_eq!(mapping.sku, Some(0));
        assert_eq!(mapping.size, Some(1));
        assert_eq!(mapping.price, Some(2));
        assert_eq!(mapping.discount, Some(3));
        assert_eq!(mapping.sales, Some(4));
    }

    #[test]
    fn test_synonym_priority_beats_column_order() {
        // "价格" sits left of "吊牌价", but "吊牌价" has higher priority
        let mapping = ColumnMapping::guess(
            &header(&["货号", "参考价格", "吊牌价"]),
            &KeywordTable::default(),
        );
        assert_eq!(mapping.price, Some(2));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let keywords = KeywordTable {
            sku: vec!["SKU".to_string()],
            ..KeywordTable::default()
        };
        let mapping = ColumnMapping::guess(&header(&["sku", "Price"]), &keywords);
        assert_eq!(mapping.sku, None);
        assert_eq!(mapping.price, Some(1));
    }

    #[test]
    fn test_missing_for_category() {
        let sku_only = ColumnMapping::default().with(ColumnRole::Sku, 0);

        assert!(sku_only.is_complete_for(Category::SupplierDiscount));
        assert_eq!(sku_only.missing_for(Category::MarketPrice), vec![ColumnRole::Price]);
        assert_eq!(sku_only.missing_for(Category::OwnedInventory), vec![ColumnRole::Sales]);
        assert_eq!(
            ColumnMapping::default().missing_for(Category::InTransitFutures),
            vec![ColumnRole::Sku, ColumnRole::Sales]
        );
    }

    #[test]
    fn test_keyword_table_partial_toml_keeps_defaults() {
        let table: KeywordTable = serde_json::from_str(r#"{"sku": ["Modelo"]}"#).unwrap();
        assert_eq!(table.sku, vec!["Modelo".to_string()]);
        assert_eq!(table.size, default_size_keywords());
        assert_eq!(table.header_keywords(), vec!["modelo".to_string()]);
    }

    #[test]
    fn test_max_column() {
        let mapping = ColumnMapping::default()
            .with(ColumnRole::Sku, 2)
            .with(ColumnRole::Sales, 7);
        assert_eq!(mapping.max_column(), Some(7));
        assert_eq!(ColumnMapping::default().max_column(), None);
    }
}
