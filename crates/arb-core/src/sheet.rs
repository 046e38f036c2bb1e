//! # Sheet Module
//!
//! The in-memory shape of a decoded spreadsheet.
//!
//! Decoding `.xlsx` / `.csv` bytes happens outside this crate. Whatever does
//! it hands over a [`Sheet`]: ordered rows of [`Cell`]s, rows of any length.
//!
//! ## JSON Shape
//! ```text
//! [
//!   ["货号", "尺码", "价格"],
//!   ["DD1391-100", "42", 1299],
//!   [null, null, null]
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Cell
// =============================================================================

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// Empty, or text that is only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Text form of the cell, trimmed.
    ///
    /// Whole numbers print without a fractional part, so a numeric product
    /// code `720055` stays `720055` rather than `720055.0`.
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => format_number(*n),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Number(n as f64)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Empty)
    }
}

// =============================================================================
// Sheet
// =============================================================================

/// A decoded sheet: rows addressable by index, cells by column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sheet {
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Wraps decoded rows.
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Sheet { rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the sheet has no rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// One row; past the end yields an empty slice.
    pub fn row(&self, index: usize) -> &[Cell] {
        self.rows.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// One cell; anything out of range reads as empty.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.row(row).get(col).unwrap_or(&EMPTY_CELL)
    }

    /// True when every cell in the row is blank (or the row does not exist).
    pub fn is_row_blank(&self, index: usize) -> bool {
        self.row(index).iter().all(Cell::is_blank)
    }

    /// Trimmed text of every cell in a row.
    pub fn row_text(&self, index: usize) -> Vec<String> {
        self.row(index).iter().map(Cell::text).collect()
    }
}

impl From<Vec<Vec<Cell>>> for Sheet {
    fn from(rows: Vec<Vec<Cell>>) -> Self {
        Sheet::new(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
