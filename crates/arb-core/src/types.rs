//! # Domain Types
//!
//! Core domain types used throughout the arbitrage workbench.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DomainRecord   │   │ ArbitrageResult │   │ SalesHistory    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  sku (join key) │   │  sku            │   │  date           │       │
//! │  │  price          │   │  cost / market  │   │  file, channel  │       │
//! │  │  discount       │   │  profit / roi   │   │  quantity       │       │
//! │  │  category       │   │  history        │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ DiscountFactor  │   │    FeeRate      │   │    Category     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  hundredths     │   │  bps (u32)      │   │  MarketPrice    │       │
//! │  │  360 = 3.6 折   │   │  1200 = 12%     │   │  SupplierDisc.  │       │
//! │  └─────────────────┘   └─────────────────┘   │  OwnedInventory │       │
//! │                                              │  InTransitFut.  │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Join Key
//! Every record and result is keyed by the normalized product code
//! (`normalize::normalize_product_code`). Nothing else links sources.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, ValidationError};
use crate::money::Money;

// =============================================================================
// Discount Factor
// =============================================================================

/// Supplier discount on the 0–10 scale, held in hundredths.
///
/// ## Why Hundredths?
/// 10 = full price, 3.6 = pay 36% of the tag price.
/// 360 hundredths keeps the math integral: `cents × 360 / 1000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountFactor(u32);

impl DiscountFactor {
    /// Hundredths value meaning "no discount".
    pub const FULL_PRICE_HUNDREDTHS: u32 = 1000;

    /// Creates a factor from hundredths (360 = 3.6).
    #[inline]
    pub const fn from_hundredths(hundredths: u32) -> Self {
        DiscountFactor(hundredths)
    }

    /// Creates a factor from a scale value, if it lies within 0–10.
    pub fn from_scale(value: f64) -> Option<Self> {
        if !value.is_finite() || !(0.0..=10.0).contains(&value) {
            return None;
        }
        Some(DiscountFactor((value * 100.0).round() as u32))
    }

    /// The "no discount" factor (10).
    #[inline]
    pub const fn full_price() -> Self {
        DiscountFactor(Self::FULL_PRICE_HUNDREDTHS)
    }

    /// Returns the factor in hundredths.
    #[inline]
    pub const fn hundredths(&self) -> u32 {
        self.0
    }

    /// Returns the factor on the 0–10 scale (for display and export).
    #[inline]
    pub fn value(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Checks whether this is the full-price factor.
    #[inline]
    pub const fn is_full_price(&self) -> bool {
        self.0 == Self::FULL_PRICE_HUNDREDTHS
    }
}

impl Default for DiscountFactor {
    fn default() -> Self {
        DiscountFactor::full_price()
    }
}

// =============================================================================
// Fee Rate
// =============================================================================

/// Platform selling fee in basis points (1200 = 12%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FeeRate(u32);

impl FeeRate {
    /// Creates a fee rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        FeeRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero fee.
    #[inline]
    pub const fn zero() -> Self {
        FeeRate(0)
    }
}

impl Default for FeeRate {
    fn default() -> Self {
        FeeRate::from_bps(crate::DEFAULT_FEE_BPS)
    }
}

// =============================================================================
// Category
// =============================================================================

/// What a record's price/discount/sales fields mean.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Resale market quotes; price is load-bearing.
    MarketPrice,
    /// Supplier discount sheets; discount is load-bearing.
    SupplierDiscount,
    /// Stock already owned; sales column holds the quantity.
    OwnedInventory,
    /// Futures positions still in transit; sales column holds the quantity.
    InTransitFutures,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 4] = [
        Category::MarketPrice,
        Category::SupplierDiscount,
        Category::OwnedInventory,
        Category::InTransitFutures,
    ];

    /// Stable machine name (also the database representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::MarketPrice => "market-price",
            Category::SupplierDiscount => "supplier-discount",
            Category::OwnedInventory => "owned-inventory",
            Category::InTransitFutures => "in-transit-futures",
        }
    }

    /// Whether the sales column carries a position quantity.
    pub fn is_position(&self) -> bool {
        matches!(self, Category::OwnedInventory | Category::InTransitFutures)
    }

    /// Whether records of this category feed the sales history.
    pub fn feeds_sales_history(&self) -> bool {
        matches!(self, Category::SupplierDiscount | Category::MarketPrice)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "market-price" | "market" | "市场价" => Ok(Category::MarketPrice),
            "supplier-discount" | "supplier" | "discount" | "折扣" => {
                Ok(Category::SupplierDiscount)
            }
            "owned-inventory" | "inventory" | "库存" => Ok(Category::OwnedInventory),
            "in-transit-futures" | "futures" | "期货" => Ok(Category::InTransitFutures),
            _ => Err(ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: Category::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            }
            .into()),
        }
    }
}

// =============================================================================
// Domain Record
// =============================================================================

/// One ingested row.
///
/// ## Invariants
/// - `price` is non-negative; it is populated for `MarketPrice`
/// - `sales` is populated for `OwnedInventory` / `InTransitFutures`
///
/// Records are immutable once stored: the store only replaces or removes
/// them in bulk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DomainRecord {
    /// Normalized product code (join key).
    pub sku: String,

    /// Free-text size label, "-" when absent.
    pub size: String,

    /// Unit price; zero when not applicable.
    pub price: Money,

    /// Supplier discount; full price when absent.
    pub discount: DiscountFactor,

    /// Sales cell as it appeared, e.g. "3000+件".
    pub sales_raw: String,

    /// Cleaned sales count.
    pub sales: u64,

    /// Channel the sheet came from.
    pub channel: String,

    /// Source file name.
    pub file_name: String,

    pub category: Category,

    #[ts(as = "String")]
    pub ingested_on: NaiveDate,
}

// =============================================================================
// Sales History
// =============================================================================

/// One observed sales figure for a SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesHistoryEntry {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub file_name: String,
    pub channel: String,
    pub quantity: u64,
}

// =============================================================================
// Arbitrage Result
// =============================================================================

/// Profitability of one purchase candidate.
///
/// ## Invariants
/// - `market_price == 0` ⇒ `profit == -cost_price` and `roi == 0.0`
/// - one result per SKU in a matcher run
/// - `sales_history` is ordered by date, most recent first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ArbitrageResult {
    pub sku: String,

    /// Size label of the purchase row that produced this result.
    pub size: String,

    /// List (tag) price from the purchase sheet.
    pub tag_price: Money,

    /// Discount applied to the tag price.
    pub discount: DiscountFactor,

    pub cost_price: Money,

    /// First stored market quote, zero when unmatched.
    pub market_price: Money,

    /// Market price after the platform fee.
    pub net_revenue: Money,

    pub profit: Money,

    /// Profit over cost; 0.0 when unmatched or cost is zero.
    pub roi: f64,

    /// Which source supplied the sales figure.
    pub source_label: String,

    pub source_file: String,

    pub inventory_qty: u64,

    pub futures_qty: u64,

    /// Peak observed sales count.
    pub sales_volume: u64,

    pub sales_history: Vec<SalesHistoryEntry>,
}

impl ArbitrageResult {
    /// Whether a market quote was found for this SKU.
    #[inline]
    pub fn is_matched(&self) -> bool {
        self.market_price.is_positive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
