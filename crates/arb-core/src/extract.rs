//! # Record Extractor
//!
//! Turns the data rows of a mapped sheet into [`DomainRecord`]s.
//!
//! ## Row Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  field      anomaly                  market   supplier   inv/futures    │
//! │  ────────   ──────────────────────   ──────   ────────   ───────────    │
//! │  sku        blank / unmapped         skip     skip       skip           │
//! │  price      non-numeric              SKIP     keep 0     keep 0         │
//! │  price      negative                 SKIP     keep 0     keep 0         │
//! │  price      blank / unmapped         SKIP     keep 0     keep 0         │
//! │  discount   non-numeric / not 0–10   keep 10  SKIP       keep 10        │
//! │  sales      blank / unmapped         keep 0   keep 0     keep 0 (!)     │
//! │                                                                         │
//! │  SKIP / keep = a RowProblem is recorded. (!) = problem recorded.        │
//! │  Blank SKU rows are skipped without a problem.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every problem on a row is recorded before deciding whether to keep it,
//! so one bad row can contribute more than one line to the report.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use ts_rs::TS;

use crate::mapping::{ColumnMapping, ColumnRole};
use crate::money::Money;
use crate::normalize::{extract_sales_count, normalize_product_code, parse_amount};
use crate::sheet::{Cell, Sheet};
use crate::types::{Category, DiscountFactor, DomainRecord};

/// Where the rows being extracted came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractContext {
    pub file_name: String,
    pub channel: String,
    pub category: Category,
    pub ingested_on: NaiveDate,
}

// =============================================================================
// Row Problems
// =============================================================================

/// What was wrong with a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum ProblemKind {
    Invalid,
    Negative,
    Missing,
    OutOfRange,
}

impl ProblemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemKind::Invalid => "invalid",
            ProblemKind::Negative => "negative",
            ProblemKind::Missing => "missing",
            ProblemKind::OutOfRange => "out-of-range",
        }
    }
}

/// A per-row validation problem.
///
/// Rendered as `row 4 [SKU: DD1391-100]: negative price "-5" (fix: ...)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RowProblem {
    /// 1-based sheet row, as a spreadsheet program shows it.
    pub row: usize,

    pub sku: Option<String>,

    pub field: ColumnRole,

    pub kind: ProblemKind,

    /// Offending cell text, empty for missing values.
    pub raw: String,

    pub suggestion: String,

    /// Whether the row was dropped because of this problem.
    pub skipped: bool,
}

impl fmt::Display for RowProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}", self.row)?;
        if let Some(sku) = &self.sku {
            write!(f, " [SKU: {}]", sku)?;
        }
        write!(f, ": {} {}", self.kind.as_str(), self.field)?;
        if !self.raw.is_empty() {
            write!(f, " \"{}\"", self.raw)?;
        }
        write!(f, " (fix: {})", self.suggestion)?;
        if self.skipped {
            f.write_str("; row skipped")?;
        }
        Ok(())
    }
}

/// Records and problems from one sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub records: Vec<DomainRecord>,
    pub problems: Vec<RowProblem>,
}

// =============================================================================
// Extraction
// =============================================================================

/// Extracts every data row below `header_row`.
///
/// Never fails: anomalies become [`RowProblem`]s and the row is either
/// skipped or kept with a safe default (see the module table).
pub fn extract_records(
    sheet: &Sheet,
    header_row: usize,
    mapping: &ColumnMapping,
    ctx: &ExtractContext,
) -> Extraction {
    let mut out = Extraction::default();

    let Some(sku_col) = mapping.sku else {
        debug!(file = %ctx.file_name, "no sku column mapped, nothing to extract");
        return out;
    };

    for index in (header_row + 1)..sheet.len() {
        if sheet.is_row_blank(index) {
            continue;
        }

        let sku = normalize_product_code(sheet.cell(index, sku_col));
        if sku.is_empty() {
            continue;
        }

        let mut row = RowCheck::new(index + 1, &sku);

        let price = read_price(sheet, index, mapping, ctx.category, &mut row);
        let discount = read_discount(sheet, index, mapping, ctx.category, &mut row);
        let (sales_raw, sales) = read_sales(sheet, index, mapping, ctx.category, &mut row);
        let size = mapping
            .size
            .map(|col| sheet.cell(index, col))
            .filter(|cell| !cell.is_blank())
            .map(Cell::text)
            .unwrap_or_else(|| "-".to_string());

        let skip = row.skip;
        out.problems.extend(row.problems);
        if skip {
            continue;
        }

        out.records.push(DomainRecord {
            sku,
            size,
            price,
            discount,
            sales_raw,
            sales,
            channel: ctx.channel.clone(),
            file_name: ctx.file_name.clone(),
            category: ctx.category,
            ingested_on: ctx.ingested_on,
        });
    }

    debug!(
        file = %ctx.file_name,
        category = %ctx.category,
        records = out.records.len(),
        problems = out.problems.len(),
        "extracted sheet"
    );
    out
}

/// Problems gathered for one row before the keep/skip decision.
struct RowCheck<'a> {
    row: usize,
    sku: &'a str,
    problems: Vec<RowProblem>,
    skip: bool,
}

impl<'a> RowCheck<'a> {
    fn new(row: usize, sku: &'a str) -> Self {
        RowCheck {
            row,
            sku,
            problems: Vec::new(),
            skip: false,
        }
    }

    fn report(
        &mut self,
        field: ColumnRole,
        kind: ProblemKind,
        raw: &Cell,
        suggestion: &str,
        load_bearing: bool,
    ) {
        self.skip |= load_bearing;
        self.problems.push(RowProblem {
            row: self.row,
            sku: Some(self.sku.to_string()),
            field,
            kind,
            raw: raw.text(),
            suggestion: suggestion.to_string(),
            skipped: load_bearing,
        });
    }
}

fn mapped_cell<'s>(
    sheet: &'s Sheet,
    index: usize,
    mapping: &ColumnMapping,
    role: ColumnRole,
) -> Option<&'s Cell> {
    mapping
        .get(role)
        .map(|col| sheet.cell(index, col))
        .filter(|cell| !cell.is_blank())
}

fn read_price(
    sheet: &Sheet,
    index: usize,
    mapping: &ColumnMapping,
    category: Category,
    row: &mut RowCheck<'_>,
) -> Money {
    let load_bearing = category == Category::MarketPrice;

    let Some(cell) = mapped_cell(sheet, index, mapping, ColumnRole::Price) else {
        if load_bearing {
            row.report(
                ColumnRole::Price,
                ProblemKind::Missing,
                &Cell::Empty,
                "fill in the market price or map the price column",
                true,
            );
        }
        return Money::zero();
    };

    match parse_amount(cell) {
        None => {
            row.report(
                ColumnRole::Price,
                ProblemKind::Invalid,
                cell,
                "enter a plain number such as 1299",
                load_bearing,
            );
            Money::zero()
        }
        Some(amount) if amount < 0.0 => {
            row.report(
                ColumnRole::Price,
                ProblemKind::Negative,
                cell,
                "prices cannot be below zero, check the sign",
                load_bearing,
            );
            Money::zero()
        }
        Some(amount) => Money::from_amount(amount),
    }
}

fn read_discount(
    sheet: &Sheet,
    index: usize,
    mapping: &ColumnMapping,
    category: Category,
    row: &mut RowCheck<'_>,
) -> DiscountFactor {
    let load_bearing = category == Category::SupplierDiscount;

    let Some(cell) = mapped_cell(sheet, index, mapping, ColumnRole::Discount) else {
        return DiscountFactor::default();
    };

    match parse_amount(cell) {
        None => {
            row.report(
                ColumnRole::Discount,
                ProblemKind::Invalid,
                cell,
                "use a factor between 0 and 10 such as 3.6",
                load_bearing,
            );
            DiscountFactor::default()
        }
        Some(value) => match DiscountFactor::from_scale(value) {
            Some(factor) => factor,
            None => {
                row.report(
                    ColumnRole::Discount,
                    ProblemKind::OutOfRange,
                    cell,
                    "use a factor between 0 and 10, where 10 is full price",
                    load_bearing,
                );
                DiscountFactor::default()
            }
        },
    }
}

fn read_sales(
    sheet: &Sheet,
    index: usize,
    mapping: &ColumnMapping,
    category: Category,
    row: &mut RowCheck<'_>,
) -> (String, u64) {
    match mapped_cell(sheet, index, mapping, ColumnRole::Sales) {
        Some(cell) => (cell.text(), extract_sales_count(cell)),
        None => {
            if category.is_position() {
                row.report(
                    ColumnRole::Sales,
                    ProblemKind::Missing,
                    &Cell::Empty,
                    "fill in the quantity held",
                    false,
                );
            }
            ("0".to_string(), 0)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
