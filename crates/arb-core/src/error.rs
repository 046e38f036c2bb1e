//! # Error Types
//!
//! Domain-specific error types for arb-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  arb-core errors (this file)                                           │
//! │  ├── CoreError        - Fatal preconditions, session misuse            │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  NOT errors: RowProblem (extract.rs)                                   │
//! │  └── per-row anomalies are accumulated, never raised                   │
//! │                                                                         │
//! │  arb-db errors (separate crate)                                        │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  App errors                                                            │
//! │  └── ApiError         - What the user sees                             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → user                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::mapping::ColumnRole;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These abort a whole operation before any record or result is produced.
/// Problems with individual rows never surface here.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The sheet has no rows at all.
    #[error("{file}: the sheet is empty")]
    EmptySheet { file: String },

    /// The header lacks columns that the operation cannot do without.
    ///
    /// ## When This Occurs
    /// - A purchase list without a SKU or tag price column
    ///
    /// ## User Workflow
    /// ```text
    /// Upload purchase list
    ///      │
    ///      ▼
    /// Header: [款号, 尺码, 备注]
    ///      │
    ///      ▼
    /// MissingColumns { missing: [price] }
    ///      │
    ///      ▼
    /// Alert: "list.xlsx: header is missing required columns (price)"
    /// ```
    #[error("{file}: header is missing required columns ({})", role_list(.missing))]
    MissingColumns {
        file: String,
        missing: Vec<ColumnRole>,
    },

    /// A mapping decision was submitted while no file awaits one.
    #[error("No file is waiting for a column mapping")]
    NoPendingDecision,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

fn role_list(roles: &[ColumnRole]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation of user-supplied values (channel names,
/// confirmed mappings, manual entries).
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
