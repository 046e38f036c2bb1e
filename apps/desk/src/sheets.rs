//! # Sheet Files
//!
//! Loads decoded sheets from disk.
//!
//! Spreadsheet decoding happens upstream; the desk reads the decoded form,
//! a JSON array of rows where each cell is a number, a string or null:
//!
//! ```json
//! [
//!   ["货号", "尺码", "得物价", "销量"],
//!   ["DD1391-100", "42", 1299, "3000+件"],
//!   ["DZ5485-612", null, 899, 120]
//! ]
//! ```

use std::path::Path;
use tracing::debug;

use arb_core::{ManualEntry, Sheet};

use crate::error::ApiResult;

/// A sheet together with the name it is reported under.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSheet {
    pub name: String,
    pub sheet: Sheet,
}

impl NamedSheet {
    pub fn new(name: impl Into<String>, sheet: Sheet) -> Self {
        NamedSheet {
            name: name.into(),
            sheet,
        }
    }
}

/// File name without directories, as shown in reports.
pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Reads one decoded sheet.
pub async fn read_sheet(path: &Path) -> ApiResult<NamedSheet> {
    let contents = tokio::fs::read_to_string(path).await?;
    let sheet: Sheet = serde_json::from_str(&contents)?;
    debug!(path = %path.display(), rows = sheet.len(), "read sheet");
    Ok(NamedSheet::new(file_label(path), sheet))
}

/// Reads hand-typed entries: a JSON array of `{sku, size, price, discount, sales}`.
pub async fn read_manual_entries(path: &Path) -> ApiResult<Vec<ManualEntry>> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use arb_core::Cell;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("arb-desk-{}-{}", std::process::id(), name))
    }

    #[tokio::test]
    async fn test_read_sheet_mixed_cells() {
        let path = scratch("market.json");
        std::fs::write(&path, r#"[["货号", "得物价"], ["DD1391-100", 1299], [null, "n/a"]]"#).unwrap();

        let named = read_sheet(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(named.name, format!("arb-desk-{}-market.json", std::process::id()));
        assert_eq!(named.sheet.len(), 3);
        assert_eq!(*named.sheet.cell(1, 1), Cell::Number(1299.0));
        assert!(named.sheet.cell(2, 0).is_blank());
    }

    #[tokio::test]
    async fn test_read_sheet_reports_bad_json() {
        let path = scratch("broken.json");
        std::fs::write(&path, "{not a sheet").unwrap();

        let err = read_sheet(&path).await.unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(err.code, ErrorCode::IoError);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = read_sheet(&scratch("absent.json")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::IoError);
    }

    #[tokio::test]
    async fn test_read_manual_entries() {
        let path = scratch("manual.json");
        std::fs::write(&path, r#"[{"sku": "dd1391-100", "price": 1299}]"#).unwrap();

        let entries = read_manual_entries(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].price, Some(1299.0));
        assert!(entries[0].size.is_none());
    }

    #[test]
    fn test_file_label() {
        assert_eq!(file_label(Path::new("/data/feb/poizon.json")), "poizon.json");
    }
}
