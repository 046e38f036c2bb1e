//! # arb-db: Database Layer for the Arbitrage Desk
//!
//! SQLite persistence for everything that outlives one run: the
//! accumulated records, the channel lists and the remembered column
//! mappings.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Arbitrage Desk Data Flow                         │
//! │                                                                         │
//! │  desk command (import, manual, clear, mappings)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     arb-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ records        │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │ channels       │    │ 001_initial  │  │   │
//! │  │   │               │    │ mappings       │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (platform data dir, or ARB_DB_PATH)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use arb_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("desk.db")).await?;
//! let mut store = db.load_store().await?;
//! let memory = db.load_memory().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::channels::ChannelRepository;
pub use repository::mappings::MappingRepository;
pub use repository::records::RecordRepository;
