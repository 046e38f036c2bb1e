//! # Arbitrage Desk Library
//!
//! Everything behind the `arb-desk` binary: state, commands and the
//! assistant client. `main.rs` only parses arguments and prints.
//!
//! ## Module Organization
//! ```text
//! arb_desk_lib/
//! ├── lib.rs          ◄─── You are here (startup & tracing)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── workbench.rs◄─── Record store + mapping memory
//! │   └── config.rs   ◄─── desk.toml + ARB_* overrides
//! ├── commands/       ◄─── import, manual, match, channels, mappings, chat
//! ├── assistant.rs    ◄─── Narrative assistant seam + HTTP adapter
//! ├── prompt.rs       ◄─── Terminal column-mapping prompt
//! ├── sheets.rs       ◄─── Decoded sheet files
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod assistant;
pub mod commands;
pub mod error;
pub mod prompt;
pub mod sheets;
pub mod state;

use tracing::info;
use tracing_subscriber::EnvFilter;

use arb_db::{Database, DbConfig};

use error::ApiResult;
use state::{DbState, DeskConfig, Workbench, WorkbenchState};

/// Everything a command may need, opened once per run.
#[derive(Debug, Clone)]
pub struct Desk {
    pub db: DbState,
    pub workbench: WorkbenchState,
    pub config: DeskConfig,
}

impl Desk {
    /// Opens the configured database and loads the workbench from it.
    ///
    /// ## Startup Sequence
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────────┐
    /// │  1. Resolve Database Path ─────────────────────────────────────────────► │
    /// │     • [database].path / ARB_DB_PATH, else the platform data dir         │
    /// │                                                                         │
    /// │  2. Connect to Database ───────────────────────────────────────────────► │
    /// │     • SQLite with WAL mode                                              │
    /// │     • Run pending migrations                                            │
    /// │                                                                         │
    /// │  3. Hydrate Workbench ─────────────────────────────────────────────────► │
    /// │     • records + channel lists → RecordStore                             │
    /// │     • column_mappings → MappingMemory                                   │
    /// └─────────────────────────────────────────────────────────────────────────┘
    /// ```
    pub async fn open(config: DeskConfig) -> ApiResult<Self> {
        let path = config.database_path()?;
        info!(?path, "Database path determined");
        Self::open_with(config, DbConfig::new(path)).await
    }

    pub async fn open_with(config: DeskConfig, db_config: DbConfig) -> ApiResult<Self> {
        let db = Database::new(db_config).await?;
        let store = db.load_store().await?;
        let memory = db.load_memory().await?;

        info!(
            records = store.len(),
            mappings = memory.len(),
            "Workbench loaded"
        );

        Ok(Desk {
            db: DbState::new(db),
            workbench: WorkbenchState::new(Workbench::new(store, memory)),
            config,
        })
    }

    /// A desk on a fresh in-memory database with default configuration.
    pub async fn in_memory() -> ApiResult<Self> {
        Self::open_with(DeskConfig::default(), DbConfig::in_memory()).await
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so command output on stdout stays clean.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=arb=trace` - Show trace for the desk crates only
/// - Default: `info,arb=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,arb=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
