//! # Database State
//!
//! Wraps the `Database` connection for use in desk commands.
//!
//! The `Database` from `arb-db` holds a `SqlitePool`, which is already
//! thread-safe, so no extra locking happens here.

use arb_db::Database;

/// Wrapper around `Database` for command state.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// db_state.inner().records().replace("Poizon", category, &rows).await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
