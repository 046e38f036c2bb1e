//! # Workbench State
//!
//! The in-memory record store and mapping memory the commands work on.
//!
//! ## Thread Safety
//! Both live behind one `Arc<Mutex<T>>`: this is the single writer path.
//! A lock is held only for the synchronous core call, never across an
//! `.await`, so persistence happens after the guard is dropped.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Workbench Operations                                 │
//! │                                                                         │
//! │  Command                  Workbench Change            Persisted By      │
//! │  ───────                  ────────────────            ────────────      │
//! │                                                                         │
//! │  import ────────────────► store.replace(..) ────────► records()        │
//! │                           memory.remember(..) ──────► mappings()       │
//! │                                                                         │
//! │  manual ────────────────► store.append(..) ─────────► records()        │
//! │                                                                         │
//! │  channels add/remove ───► store.add_channel(..) ────► channels()       │
//! │                                                                         │
//! │  clear ─────────────────► store.clear() ────────────► records()        │
//! │                                                                         │
//! │  match ─────────────────► (read only)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use arb_core::{MappingMemory, RecordStore};

/// Everything a command can read or change in memory.
#[derive(Debug, Clone, Default)]
pub struct Workbench {
    pub store: RecordStore,
    pub memory: MappingMemory,
}

impl Workbench {
    pub fn new(store: RecordStore, memory: MappingMemory) -> Self {
        Workbench { store, memory }
    }
}

/// Shared handle to the workbench.
#[derive(Debug, Clone, Default)]
pub struct WorkbenchState {
    workbench: Arc<Mutex<Workbench>>,
}

impl WorkbenchState {
    pub fn new(workbench: Workbench) -> Self {
        WorkbenchState {
            workbench: Arc::new(Mutex::new(workbench)),
        }
    }

    /// Executes a function with read access to the workbench.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let count = state.with_workbench(|w| w.store.len());
    /// ```
    pub fn with_workbench<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Workbench) -> R,
    {
        // A panic mid-command leaves whole records behind, never half a row
        let guard = self.workbench.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Executes a function with write access to the workbench.
    pub fn with_workbench_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Workbench) -> R,
    {
        let mut guard = self.workbench.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arb_core::{Category, ColumnMapping};

    #[test]
    fn test_mutations_are_shared_between_clones() {
        let state = WorkbenchState::default();
        let other = state.clone();

        other.with_workbench_mut(|w| {
            w.store.add_channel(Category::MarketPrice, "Poizon");
            w.memory.remember("a|b", ColumnMapping::default(), "a.json");
        });

        state.with_workbench(|w| {
            assert_eq!(w.store.channels(Category::MarketPrice), ["Poizon".to_string()]);
            assert_eq!(w.memory.len(), 1);
        });
    }
}
