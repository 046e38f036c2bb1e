//! # arb-core: Pure Logic for the Arbitrage Desk
//!
//! This crate holds everything between "a decoded sheet" and "a ranked
//! list of purchase candidates". It performs no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Arbitrage Desk Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    arb-desk (CLI / commands)                    │   │
//! │  │    import ──► mapping prompt ──► match ──► export / ask         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ arb-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   sheet ─► header ─► mapping/memory ─► extract ─► store         │   │
//! │  │                                                    │            │   │
//! │  │   purchase sheet ───────────────────► matcher ◄────┘            │   │
//! │  │                                          │                      │   │
//! │  │                                export ◄──┴──► summary           │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • NO CLOCK                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    arb-db (Database Layer)                      │   │
//! │  │          records, channels, remembered column mappings          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`sheet`] - Decoded sheet and cell types
//! - [`normalize`] - Product code, sales count and discount normalizers
//! - [`header`] - Header row locator and signatures
//! - [`mapping`] - Keyword table and column-role guessing
//! - [`memory`] - Remembered mappings keyed by header signature
//! - [`extract`] - Row extraction with problem accumulation
//! - [`store`] - Accumulated record store
//! - [`ingest`] - Multi-file ingestion session and manual entry
//! - [`matcher`] - Arbitrage matching and ranking
//! - [`export`] - Tabular export
//! - [`summary`] - Assistant summary text
//!
//! ## Example Usage
//!
//! ```rust
//! use arb_core::{match_purchase_list, MappingMemory, MatcherOptions, RecordStore};
//! use arb_core::sheet::{Cell, Sheet};
//! use chrono::NaiveDate;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let purchase = Sheet::new(vec![
//!     vec![Cell::from("货号"), Cell::from("吊牌价"), Cell::from("折扣")],
//!     vec![Cell::from("DD1391-100"), Cell::from(1000.0), Cell::from(3.6)],
//! ]);
//!
//! let results = match_purchase_list(
//!     &purchase,
//!     "list.xlsx",
//!     &RecordStore::new(),
//!     &MappingMemory::new(),
//!     &MatcherOptions::new(today),
//! )
//! .unwrap();
//!
//! // nothing stored yet, so the candidate is shown as a loss of its cost
//! assert_eq!(results[0].profit.cents(), -36_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod export;
pub mod extract;
pub mod header;
pub mod ingest;
pub mod mapping;
pub mod matcher;
pub mod memory;
pub mod money;
pub mod normalize;
pub mod sheet;
pub mod store;
pub mod summary;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use export::{ExportCell, ExportTable};
pub use extract::{extract_records, ExtractContext, Extraction, ProblemKind, RowProblem};
pub use header::{locate_header_row, HEADER_SCAN_LIMIT};
pub use ingest::{
    enter_manual, IngestReport, IngestSession, IngestStep, ManualEntry, MappingDecision,
    MappingRequest, MappingState,
};
pub use mapping::{ColumnMapping, ColumnRole, KeywordTable};
pub use matcher::{match_purchase_list, MatcherOptions, NO_DATA_LABEL, PURCHASE_LIST_CHANNEL};
pub use memory::{MappingMemory, RememberedMapping};
pub use money::Money;
pub use sheet::{Cell, Sheet};
pub use store::{ChannelSummary, RecordStore};
pub use summary::{render_summary, SUMMARY_LIMIT};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default platform selling fee in basis points (12%).
///
/// Net revenue is the market price minus this fee. Override it through
/// `MatcherOptions::with_fee` when a channel charges differently.
pub const DEFAULT_FEE_BPS: u32 = 1200;
