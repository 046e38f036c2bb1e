//! # Mapping Memory
//!
//! Confirmed column mappings keyed by exact header signature.
//!
//! ```text
//! ┌────────────────────────────┐        ┌──────────────────────────────┐
//! │ "货号|尺码|得物价"          │ ─────► │ sku=0 size=1 price=2         │
//! │ "Style Code|Qty|Remark"    │ ─────► │ sku=0 sales=1                │
//! └────────────────────────────┘        └──────────────────────────────┘
//! ```
//!
//! A hit is trusted unconditionally: a person already confirmed this
//! exact header shape once, so the completeness check is skipped. Entries
//! never expire; they go away only through [`MappingMemory::forget`],
//! [`MappingMemory::clear`] or an overwrite by a newer confirmation.
//!
//! This type is the in-memory view. Persistence across runs lives in
//! `arb-db` (`column_mappings` table).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::mapping::ColumnMapping;

/// A persisted mapping record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RememberedMapping {
    /// Pipe-joined trimmed header cells.
    pub signature: String,

    pub mapping: ColumnMapping,

    /// Human label, by default the file the mapping was confirmed on.
    pub label: String,
}

/// Signature → remembered mapping.
#[derive(Debug, Clone, Default)]
pub struct MappingMemory {
    entries: HashMap<String, RememberedMapping>,
}

impl MappingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the memory from persisted entries. Later duplicates win.
    pub fn from_entries(entries: impl IntoIterator<Item = RememberedMapping>) -> Self {
        let mut memory = MappingMemory::new();
        for entry in entries {
            memory.entries.insert(entry.signature.clone(), entry);
        }
        memory
    }

    /// Exact-signature lookup.
    pub fn lookup(&self, signature: &str) -> Option<&ColumnMapping> {
        self.entries.get(signature).map(|entry| &entry.mapping)
    }

    /// Stores (or overwrites) a confirmation and returns the stored record.
    pub fn remember(
        &mut self,
        signature: impl Into<String>,
        mapping: ColumnMapping,
        label: impl Into<String>,
    ) -> RememberedMapping {
        let entry = RememberedMapping {
            signature: signature.into(),
            mapping,
            label: label.into(),
        };
        self.entries.insert(entry.signature.clone(), entry.clone());
        entry
    }

    /// Removes one signature. Returns whether it was present.
    pub fn forget(&mut self, signature: &str) -> bool {
        self.entries.remove(signature).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, sorted by signature.
    pub fn entries(&self) -> Vec<&RememberedMapping> {
        let mut all: Vec<_> = self.entries.values().collect();
        all.sort_by(|a, b| a.signature.cmp(&b.signature));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ColumnRole;

    #[test]
    fn test_remember_and_lookup() {
        let mut memory = MappingMemory::new();
        let mapping = ColumnMapping::default().with(ColumnRole::Sku, 1);

        memory.remember("A|货号", mapping, "supplier.xlsx");

        assert_eq!(memory.lookup("A|货号"), Some(&mapping));
        assert_eq!(memory.lookup("A|货号|"), None);
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_confirmation_overwrites() {
        let mut memory = MappingMemory::new();
        memory.remember("sig", ColumnMapping::default().with(ColumnRole::Sku, 0), "a.csv");
        let newer = ColumnMapping::default()
            .with(ColumnRole::Sku, 2)
            .with(ColumnRole::Price, 3);
        memory.remember("sig", newer, "b.csv");

        assert_eq!(memory.len(), 1);
        assert_eq!(memory.lookup("sig"), Some(&newer));
        assert_eq!(memory.entries()[0].label, "b.csv");
    }

    #[test]
    fn test_forget_and_clear() {
        let mut memory = MappingMemory::from_entries(vec![
            RememberedMapping {
                signature: "b".into(),
                mapping: ColumnMapping::default(),
                label: "b".into(),
            },
            RememberedMapping {
                signature: "a".into(),
                mapping: ColumnMapping::default(),
                label: "a".into(),
            },
        ]);

        let order: Vec<_> = memory.entries().iter().map(|e| e.signature.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);

        assert!(memory.forget("a"));
        assert!(!memory.forget("a"));
        memory.clear();
        assert!(memory.is_empty());
    }
}
