//! # State Module
//!
//! Application state for the desk, split by concern so each command takes
//! only what it touches.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐          │
//! │  │   DbState    │  │  WorkbenchState  │  │   DeskConfig     │          │
//! │  │              │  │                  │  │                  │          │
//! │  │  Database    │  │  Arc<Mutex<      │  │  fee, keywords   │          │
//! │  │  (SQLite     │  │    RecordStore + │  │  assistant       │          │
//! │  │   pool)      │  │    MappingMemory │  │  summary limit   │          │
//! │  │              │  │  >>              │  │                  │          │
//! │  └──────────────┘  └──────────────────┘  └──────────────────┘          │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • WorkbenchState: Protected by Arc<Mutex<T>> for exclusive access     │
//! │  • DeskConfig: Read-only after startup                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod workbench;

pub use config::{
    AssistantSettings, ConfigError, ConfigResult, DatabaseSettings, DeskConfig, MatchingSettings,
};
pub use db::DbState;
pub use workbench::{Workbench, WorkbenchState};
