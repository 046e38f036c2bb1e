//! # Header Locator
//!
//! Finds the header row of an uploaded sheet.
//!
//! Supplier and market sheets often carry a title block, a date line or a
//! merged banner above the real column labels:
//!
//! ```text
//!  row 0   │ 2024 春季折扣表                          │
//!  row 1   │ 联系人: 王先生                           │
//!  row 2   │ 货号 │ 尺码 │ 吊牌价 │ 折扣 │ 库存       │  ← header (index 2)
//!  row 3   │ DD1391-100 │ 42 │ 899 │ 3.6 │ 12         │
//! ```
//!
//! The first row (within [`HEADER_SCAN_LIMIT`]) whose lower-cased text
//! mentions any product-code synonym is the header. When nothing matches
//! the first row is assumed; a wrong guess shows up later as rows without
//! a SKU, never as an error here.

use crate::mapping::KeywordTable;
use crate::sheet::Sheet;

/// Rows inspected before giving up and assuming row 0.
pub const HEADER_SCAN_LIMIT: usize = 20;

/// Separator used to build header signatures.
pub const SIGNATURE_SEPARATOR: &str = "|";

/// Index of the header row.
///
/// ## Example
/// ```rust
/// use arb_core::header::locate_header_row;
/// use arb_core::mapping::KeywordTable;
/// use arb_core::sheet::{Cell, Sheet};
///
/// let sheet = Sheet::new(vec![
///     vec![Cell::from("春季折扣表")],
///     vec![Cell::from("货号"), Cell::from("折扣")],
///     vec![Cell::from("DD1391-100"), Cell::from(3.6)],
/// ]);
/// assert_eq!(locate_header_row(&sheet, &KeywordTable::default()), 1);
/// ```
pub fn locate_header_row(sheet: &Sheet, keywords: &KeywordTable) -> usize {
    let needles = keywords.header_keywords();
    let limit = sheet.len().min(HEADER_SCAN_LIMIT);

    (0..limit)
        .find(|&index| {
            let flattened = sheet.row_text(index).join(" ").to_lowercase();
            needles.iter().any(|needle| flattened.contains(needle.as_str()))
        })
        .unwrap_or(0)
}

/// Pipe-joined trimmed header cells, the key of the mapping memory.
pub fn header_signature(cells: &[String]) -> String {
    cells.join(SIGNATURE_SEPARATOR)
}

/// A located header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Row index within the sheet.
    pub index: usize,

    /// Trimmed header cell text.
    pub cells: Vec<String>,

    /// Mapping-memory key for this header shape.
    pub signature: String,
}

impl HeaderInfo {
    /// Number of header cells (valid column indices are below this).
    pub fn width(&self) -> usize {
        self.cells.len()
    }
}

/// Locates the header and captures its cells and signature.
pub fn read_header(sheet: &Sheet, keywords: &KeywordTable) -> HeaderInfo {
    let index = locate_header_row(sheet, keywords);
    let cells = sheet.row_text(index);
    let signature = header_signature(&cells);
    HeaderInfo {
        index,
        cells,
        signature,
    }
}
