//! # Ingestion Session
//!
//! Drives a multi-file upload for one (channel, category) pair.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  enqueue(file)                                                          │
//! │     │                                                                   │
//! │     ├── signature remembered ──────────────► Resolved ──┐               │
//! │     ├── guess complete for category ───────► AutoComplete ─┤            │
//! │     └── otherwise ─────────────────────────► AwaitingMapping            │
//! │                                                  │         │            │
//! │                         resolve(Confirm(m)) ─────┤         ▼            │
//! │                              └─► Resolved        │      extracted       │
//! │                         resolve(Skip) ───────────┘                      │
//! │                              └─► Skipped                                │
//! │                                                                         │
//! │  advance(): extract head files until one is AwaitingMapping             │
//! │             → NeedsMapping(request)                                     │
//! │             queue empty → replace store records once → Finished(report) │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Files are handled strictly in the order they were queued, so the final
//! replace of the pair's records is deterministic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, info};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::extract::{extract_records, ExtractContext, Extraction, RowProblem};
use crate::header::{read_header, HeaderInfo};
use crate::mapping::{ColumnMapping, ColumnRole, KeywordTable};
use crate::memory::{MappingMemory, RememberedMapping};
use crate::sheet::{Cell, Sheet};
use crate::store::RecordStore;
use crate::types::{Category, DomainRecord};
use crate::validation::{validate_channel_name, validate_mapping_for_header};

/// File name recorded on manually entered records.
pub const MANUAL_ENTRY_FILE: &str = "manual entry";

// =============================================================================
// Queue Types
// =============================================================================

/// Where a queued file stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum MappingState {
    /// The guessed mapping satisfies the category's required roles.
    AutoComplete,
    /// A person has to confirm or skip.
    AwaitingMapping,
    /// Confirmed now, or remembered from an earlier confirmation.
    Resolved,
    Skipped,
}

/// A file waiting in the session queue.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub file_name: String,
    pub sheet: Sheet,
    pub header: HeaderInfo,
    pub guess: ColumnMapping,
    pub state: MappingState,
    /// Mapping used for extraction once the file is settled.
    pub mapping: Option<ColumnMapping>,
}

/// The answer to a [`MappingRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingDecision {
    Confirm(ColumnMapping),
    Skip,
}

/// What the caller needs to show to get a [`MappingDecision`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MappingRequest {
    pub file_name: String,
    pub header: Vec<String>,
    pub signature: String,
    pub guess: ColumnMapping,
    /// Roles the guess is missing for this category.
    pub missing: Vec<ColumnRole>,
}

/// Result of [`IngestSession::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum IngestStep {
    NeedsMapping(MappingRequest),
    Finished(IngestReport),
}

// =============================================================================
// Report
// =============================================================================

/// A row problem tagged with the file it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FileProblem {
    pub file_name: String,
    pub problem: RowProblem,
}

impl fmt::Display for FileProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file_name, self.problem)
    }
}

/// Outcome of a finished session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IngestReport {
    pub channel: String,
    pub category: Option<Category>,
    pub files_imported: usize,
    pub rows_imported: usize,
    /// Previously stored records dropped by the replace.
    pub rows_replaced: usize,
    pub skipped_files: Vec<String>,
    pub problems: Vec<FileProblem>,
}

impl IngestReport {
    pub fn has_problems(&self) -> bool {
        !self.problems.is_empty() || !self.skipped_files.is_empty()
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "imported {} files, {} rows",
            self.files_imported, self.rows_imported
        )?;
        if !self.has_problems() {
            return Ok(());
        }
        f.write_str(", with the following problems:")?;
        for file in &self.skipped_files {
            write!(f, "\n{}: skipped, no column mapping confirmed", file)?;
        }
        for problem in &self.problems {
            write!(f, "\n{}", problem)?;
        }
        Ok(())
    }
}

// =============================================================================
// Session
// =============================================================================

/// Sequential pending-mapping queue for one upload batch.
#[derive(Debug)]
pub struct IngestSession {
    channel: String,
    category: Category,
    ingested_on: NaiveDate,
    keywords: KeywordTable,
    queue: VecDeque<PendingFile>,
    collected: Vec<DomainRecord>,
    report: IngestReport,
    committed: bool,
}

impl IngestSession {
    /// Opens a session. The channel name is validated here.
    pub fn new(
        channel: &str,
        category: Category,
        ingested_on: NaiveDate,
        keywords: KeywordTable,
    ) -> CoreResult<Self> {
        validate_channel_name(channel)?;
        let channel = channel.trim().to_string();
        Ok(IngestSession {
            report: IngestReport {
                channel: channel.clone(),
                category: Some(category),
                ..IngestReport::default()
            },
            channel,
            category,
            ingested_on,
            keywords,
            queue: VecDeque::new(),
            collected: Vec::new(),
            committed: false,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Queued files with their current state.
    pub fn pending(&self) -> impl Iterator<Item = (&str, MappingState)> {
        self.queue.iter().map(|f| (f.file_name.as_str(), f.state))
    }

    /// Queues a decoded sheet and classifies its header.
    ///
    /// ## Errors
    /// - `CoreError::EmptySheet` when the sheet has no rows
    pub fn enqueue(
        &mut self,
        file_name: &str,
        sheet: Sheet,
        memory: &MappingMemory,
    ) -> CoreResult<MappingState> {
        if sheet.is_empty() {
            return Err(CoreError::EmptySheet {
                file: file_name.to_string(),
            });
        }

        let header = read_header(&sheet, &self.keywords);
        let guess = ColumnMapping::guess(&header.cells, &self.keywords);

        let (state, mapping) = match memory.lookup(&header.signature) {
            Some(remembered) => (MappingState::Resolved, Some(*remembered)),
            None if guess.is_complete_for(self.category) => {
                (MappingState::AutoComplete, Some(guess))
            }
            None => (MappingState::AwaitingMapping, None),
        };

        debug!(
            file = %file_name,
            header_row = header.index,
            signature = %header.signature,
            state = ?state,
            "queued sheet"
        );

        self.queue.push_back(PendingFile {
            file_name: file_name.to_string(),
            sheet,
            header,
            guess,
            state,
            mapping,
        });
        Ok(state)
    }

    /// Processes queued files until one needs a decision or the queue drains.
    ///
    /// On drain the collected records replace the store's records for this
    /// channel and category, once, and only if at least one file was
    /// imported. Calling again afterwards returns the same report.
    pub fn advance(&mut self, store: &mut RecordStore) -> IngestStep {
        while let Some(head) = self.queue.front() {
            match head.state {
                MappingState::AwaitingMapping => {
                    return IngestStep::NeedsMapping(MappingRequest {
                        file_name: head.file_name.clone(),
                        header: head.header.cells.clone(),
                        signature: head.header.signature.clone(),
                        guess: head.guess,
                        missing: head.guess.missing_for(self.category),
                    });
                }
                MappingState::Skipped => {
                    if let Some(file) = self.queue.pop_front() {
                        debug!(file = %file.file_name, "skipped sheet");
                        self.report.skipped_files.push(file.file_name);
                    }
                }
                MappingState::AutoComplete | MappingState::Resolved => {
                    if let Some(file) = self.queue.pop_front() {
                        self.import(file);
                    }
                }
            }
        }

        self.commit(store);
        IngestStep::Finished(self.report.clone())
    }

    /// Settles the file at the head of the queue.
    ///
    /// A confirmation is remembered under the header signature and returned
    /// so the caller can persist it. Queued files with the same header that
    /// still await a decision are resolved with it too.
    ///
    /// ## Errors
    /// - `CoreError::NoPendingDecision` when the head file is not awaiting one
    /// - `CoreError::Validation` when the mapping lacks a SKU column or points
    ///   past the header
    pub fn resolve(
        &mut self,
        decision: MappingDecision,
        memory: &mut MappingMemory,
    ) -> CoreResult<Option<RememberedMapping>> {
        let head = match self.queue.front_mut() {
            Some(head) if head.state == MappingState::AwaitingMapping => head,
            _ => return Err(CoreError::NoPendingDecision),
        };

        match decision {
            MappingDecision::Skip => {
                head.state = MappingState::Skipped;
                Ok(None)
            }
            MappingDecision::Confirm(mapping) => {
                validate_mapping_for_header(&mapping, head.header.width())?;
                let remembered =
                    memory.remember(head.header.signature.clone(), mapping, head.file_name.clone());

                for file in self.queue.iter_mut() {
                    if file.state == MappingState::AwaitingMapping
                        && file.header.signature == remembered.signature
                    {
                        file.state = MappingState::Resolved;
                        file.mapping = Some(mapping);
                    }
                }

                info!(
                    signature = %remembered.signature,
                    label = %remembered.label,
                    "remembered column mapping"
                );
                Ok(Some(remembered))
            }
        }
    }

    fn import(&mut self, file: PendingFile) {
        let Some(mapping) = file.mapping else {
            self.report.skipped_files.push(file.file_name);
            return;
        };

        let ctx = ExtractContext {
            file_name: file.file_name.clone(),
            channel: self.channel.clone(),
            category: self.category,
            ingested_on: self.ingested_on,
        };
        let Extraction { records, problems } =
            extract_records(&file.sheet, file.header.index, &mapping, &ctx);

        self.report.files_imported += 1;
        self.report.rows_imported += records.len();
        self.report
            .problems
            .extend(problems.into_iter().map(|problem| FileProblem {
                file_name: file.file_name.clone(),
                problem,
            }));
        self.collected.extend(records);
    }

    fn commit(&mut self, store: &mut RecordStore) {
        if self.committed {
            return;
        }
        self.committed = true;

        if self.report.files_imported == 0 {
            info!(
                channel = %self.channel,
                category = %self.category,
                "nothing imported, store untouched"
            );
            return;
        }

        let records = std::mem::take(&mut self.collected);
        self.report.rows_replaced = store.replace(&self.channel, self.category, records);

        info!(
            channel = %self.channel,
            category = %self.category,
            files = self.report.files_imported,
            rows = self.report.rows_imported,
            replaced = self.report.rows_replaced,
            problems = self.report.problems.len(),
            "ingestion finished"
        );
    }
}

// =============================================================================
// Manual Entry
// =============================================================================

/// One hand-typed record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ManualEntry {
    pub sku: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(default)]
    pub sales: Option<String>,
}

/// Validates manual entries through the extractor and appends them.
///
/// The entries go through the same row policy as uploaded sheets, so a
/// market quote typed with a negative price is rejected the same way.
pub fn enter_manual(
    store: &mut RecordStore,
    entries: &[ManualEntry],
    channel: &str,
    category: Category,
    ingested_on: NaiveDate,
) -> CoreResult<Extraction> {
    validate_channel_name(channel)?;

    let mut rows: Vec<Vec<Cell>> = vec![ColumnRole::ALL
        .iter()
        .map(|role| Cell::from(role.as_str()))
        .collect()];
    rows.extend(entries.iter().map(|entry| {
        vec![
            Cell::from(entry.sku.as_str()),
            Cell::from(entry.size.clone()),
            Cell::from(entry.price),
            Cell::from(entry.discount),
            Cell::from(entry.sales.clone()),
        ]
    }));

    let mapping = ColumnMapping::default()
        .with(ColumnRole::Sku, 0)
        .with(ColumnRole::Size, 1)
        .with(ColumnRole::Price, 2)
        .with(ColumnRole::Discount, 3)
        .with(ColumnRole::Sales, 4);
    let ctx = ExtractContext {
        file_name: MANUAL_ENTRY_FILE.to_string(),
        channel: channel.trim().to_string(),
        category,
        ingested_on,
    };

    let extraction = extract_records(&Sheet::new(rows), 0, &mapping, &ctx);
    store.append(extraction.records.clone());

    info!(
        channel = %ctx.channel,
        category = %category,
        added = extraction.records.len(),
        problems = extraction.problems.len(),
        "manual entries appended"
    );
    Ok(extraction)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn session(category: Category) -> IngestSession {
        IngestSession::new("Poizon", category, today(), KeywordTable::default()).unwrap()
    }

    fn market_sheet(sku: &str, price: f64) -> Sheet {
        Sheet::new(vec![
            vec!["货号".into(), "价格".into()],
            vec![sku.into(), price.into()],
        ])
    }

    /// A header the keyword table cannot fully map: no price column.
    fn odd_sheet() -> Sheet {
        Sheet::new(vec![
            vec!["货号".into(), "成交".into()],
            vec!["A1".into(), 1500.0.into()],
        ])
    }

    fn finished(step: IngestStep) -> IngestReport {
        match step {
            IngestStep::Finished(report) => report,
            other => panic!("expected Finished, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_empty_sheet_and_bad_channel() {
        let mut s = session(Category::MarketPrice);
        let err = s
            .enqueue("empty.csv", Sheet::default(), &MappingMemory::new())
            .unwrap_err();
        assert!(matches!(err, CoreError::EmptySheet { .. }));

        let blank =
            IngestSession::new(" ", Category::MarketPrice, today(), KeywordTable::default());
        assert!(blank.is_err());
    }

    #[test]
    fn test_auto_complete_files_replace_store_once() {
        let mut store = RecordStore::new();
        let mut s = session(Category::MarketPrice);
        let memory = MappingMemory::new();

        let a = s.enqueue("a.xlsx", market_sheet("A1", 100.0), &memory).unwrap();
        let b = s.enqueue("b.xlsx", market_sheet("B2", 200.0), &memory).unwrap();
        assert_eq!(a, MappingState::AutoComplete);
        assert_eq!(b, MappingState::AutoComplete);

        let report = finished(s.advance(&mut store));
        assert_eq!(report.files_imported, 2);
        assert_eq!(report.rows_imported, 2);
        assert_eq!(report.to_string(), "imported 2 files, 2 rows");
        assert_eq!(store.len(), 2);

        // a second advance must not replace again
        let again = finished(s.advance(&mut store));
        assert_eq!(again, report);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_reupload_replaces_previous_records() {
        let mut store = RecordStore::new();
        let memory = MappingMemory::new();

        let mut first = session(Category::MarketPrice);
        first.enqueue("a.xlsx", market_sheet("A1", 100.0), &memory).unwrap();
        finished(first.advance(&mut store));

        let mut second = session(Category::MarketPrice);
        second.enqueue("a.xlsx", market_sheet("A1", 120.0), &memory).unwrap();
        let report = finished(second.advance(&mut store));

        assert_eq!(report.rows_replaced, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.market_price("A1"), Money::from_cents(12_000));
    }

    #[test]
    fn test_incomplete_guess_waits_for_decision() {
        let mut store = RecordStore::new();
        let mut memory = MappingMemory::new();
        let mut s = session(Category::MarketPrice);

        let state = s.enqueue("odd.xlsx", odd_sheet(), &memory).unwrap();
        assert_eq!(state, MappingState::AwaitingMapping);

        let request = match s.advance(&mut store) {
            IngestStep::NeedsMapping(request) => request,
            other => panic!("expected NeedsMapping, got {:?}", other),
        };
        assert_eq!(request.signature, "货号|成交");
        assert_eq!(request.missing, vec![ColumnRole::Price]);
        assert!(store.is_empty());

        let confirmed = ColumnMapping::default()
            .with(ColumnRole::Sku, 0)
            .with(ColumnRole::Price, 1);
        let remembered = s
            .resolve(MappingDecision::Confirm(confirmed), &mut memory)
            .unwrap()
            .unwrap();
        assert_eq!(remembered.label, "odd.xlsx");
        assert_eq!(memory.lookup("货号|成交"), Some(&confirmed));

        let report = finished(s.advance(&mut store));
        assert_eq!(report.files_imported, 1);
        assert_eq!(store.market_price("A1"), Money::from_cents(150_000));
    }

    #[test]
    fn test_remembered_mapping_bypasses_completeness_check() {
        let mut memory = MappingMemory::new();
        // confirmed once without a price column
        memory.remember("货号|成交", ColumnMapping::default().with(ColumnRole::Sku, 0), "odd.xlsx");

        let mut store = RecordStore::new();
        let mut s = session(Category::MarketPrice);
        assert_eq!(s.enqueue("odd.xlsx", odd_sheet(), &memory).unwrap(), MappingState::Resolved);

        let report = finished(s.advance(&mut store));
        assert_eq!(report.files_imported, 1);
        // trusted mapping, but rows still need a market price
        assert_eq!(report.rows_imported, 0);
        assert_eq!(report.problems.len(), 1);
    }

    #[test]
    fn test_skip_leaves_store_untouched() {
        let mut store = RecordStore::new();
        let mut memory = MappingMemory::new();
        let mut s = session(Category::MarketPrice);
        s.enqueue("odd.xlsx", odd_sheet(), &memory).unwrap();

        assert!(matches!(s.advance(&mut store), IngestStep::NeedsMapping(_)));
        assert_eq!(s.resolve(MappingDecision::Skip, &mut memory).unwrap(), None);

        let report = finished(s.advance(&mut store));
        assert_eq!(report.files_imported, 0);
        assert_eq!(report.skipped_files, vec!["odd.xlsx".to_string()]);
        assert!(report.to_string().contains("odd.xlsx: skipped"));
        assert!(memory.is_empty());
    }

    #[test]
    fn test_resolve_without_pending_file_errors() {
        let mut memory = MappingMemory::new();
        let mut s = session(Category::MarketPrice);
        let err = s.resolve(MappingDecision::Skip, &mut memory).unwrap_err();
        assert!(matches!(err, CoreError::NoPendingDecision));
    }

    #[test]
    fn test_confirm_requires_sku() {
        let mut memory = MappingMemory::new();
        let mut s = session(Category::MarketPrice);
        s.enqueue("odd.xlsx", odd_sheet(), &memory).unwrap();

        let bad = ColumnMapping::default().with(ColumnRole::Price, 1);
        let err = s.resolve(MappingDecision::Confirm(bad), &mut memory).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(s.pending().next(), Some(("odd.xlsx", MappingState::AwaitingMapping)));
    }

    #[test]
    fn test_confirmation_applies_to_queued_twin() {
        let mut store = RecordStore::new();
        let mut memory = MappingMemory::new();
        let mut s = session(Category::MarketPrice);
        s.enqueue("one.xlsx", odd_sheet(), &memory).unwrap();
        s.enqueue("two.xlsx", odd_sheet(), &memory).unwrap();

        assert!(matches!(s.advance(&mut store), IngestStep::NeedsMapping(_)));
        let mapping = ColumnMapping::default()
            .with(ColumnRole::Sku, 0)
            .with(ColumnRole::Price, 1);
        s.resolve(MappingDecision::Confirm(mapping), &mut memory).unwrap();

        let report = finished(s.advance(&mut store));
        assert_eq!(report.files_imported, 2);
    }

    #[test]
    fn test_report_lists_problems() {
        let mut store = RecordStore::new();
        let mut s = session(Category::MarketPrice);
        let sheet = Sheet::new(vec![
            vec!["货号".into(), "价格".into()],
            vec!["A1".into(), (-5.0).into()],
            vec!["B2".into(), 10.0.into()],
        ]);
        s.enqueue("m.xlsx", sheet, &MappingMemory::new()).unwrap();

        let text = finished(s.advance(&mut store)).to_string();
        assert!(text.starts_with("imported 1 files, 1 rows, with the following problems:"));
        assert!(text.contains("m.xlsx: row 2 [SKU: A1]: negative price"));
    }

    #[test]
    fn test_manual_entry_appends() {
        let mut store = RecordStore::new();
        let entries = vec![
            ManualEntry {
                sku: "dd1391-100".to_string(),
                price: Some(1299.0),
                sales: Some("20".to_string()),
                ..ManualEntry::default()
            },
            ManualEntry {
                sku: "bad".to_string(),
                price: Some(-1.0),
                ..ManualEntry::default()
            },
        ];

        let out =
            enter_manual(&mut store, &entries, "Poizon", Category::MarketPrice, today()).unwrap();
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.problems.len(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].file_name, MANUAL_ENTRY_FILE);
        assert_eq!(store.records()[0].size, "-");
    }
}
