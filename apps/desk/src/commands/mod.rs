//! # Commands Module
//!
//! Every desk operation, callable from the CLI or from tests.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── ingest.rs     ◄─── Sheet import with mapping decisions
//! ├── records.rs    ◄─── Manual entry, channels, clear, status
//! ├── arbitrage.rs  ◄─── Purchase list matching and export
//! ├── mappings.rs   ◄─── Remembered column mappings
//! └── assistant.rs  ◄─── Narrative chat over match results
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  arb-desk import --channel Poizon --category market-price feb.json     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  main.rs parses arguments, reads files                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  commands::ingest::import_sheets(                                       │
//! │      &desk.db,          ◄── DbState                                     │
//! │      &desk.workbench,   ◄── WorkbenchState                              │
//! │      &desk.config,      ◄── DeskConfig                                  │
//! │      request, prompt,                                                   │
//! │  ) -> Result<IngestReport, ApiError>                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  1. core call under the workbench lock                                  │
//! │  2. lock released, change written through to SQLite                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod arbitrage;
pub mod assistant;
pub mod ingest;
pub mod mappings;
pub mod records;
