//! # Ingest Commands
//!
//! Imports a batch of sheets into one channel and category.
//!
//! ## Batch Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  files ──► enqueue all (empty sheet aborts before anything changes)    │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │            advance ◄──────────────────────────────┐                    │
//! │                 │                                  │                    │
//! │     ┌───────────┴───────────┐                      │                    │
//! │     ▼                       ▼                      │                    │
//! │  NeedsMapping           Finished               prompt decides          │
//! │     │                       │                  Confirm / Skip          │
//! │     └───────────────────────┼──────────────────────┘                    │
//! │                             ▼                                           │
//! │            mappings().upsert(each confirmation)                        │
//! │            records().replace(channel, category)                        │
//! │            channels().add(category, channel)                           │
//! │                             ▼                                           │
//! │            workbench updated from the staged copy                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use tracing::{debug, info};

use arb_core::{
    Category, CoreError, DomainRecord, IngestReport, IngestSession, IngestStep, MappingDecision,
    MappingRequest,
};

use crate::error::ApiResult;
use crate::sheets::NamedSheet;
use crate::state::{DbState, DeskConfig, WorkbenchState};

/// Asks whoever is at the desk how to map an unrecognized header.
pub trait MappingPrompt {
    fn decide(&mut self, request: &MappingRequest) -> MappingDecision;

    /// Called when a confirmed mapping was refused; the same request is
    /// presented again afterwards.
    fn rejected(&mut self, reason: &str);
}

/// One import batch.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub channel: String,
    pub category: Category,
    pub ingested_on: NaiveDate,
    pub sheets: Vec<NamedSheet>,
}

/// Runs a batch through an ingestion session and persists the outcome.
///
/// ## Errors
/// - `EMPTY_SHEET` when any file has no rows; nothing is imported then
/// - `VALIDATION_ERROR` for a bad channel name
pub async fn import_sheets(
    db: &DbState,
    workbench: &WorkbenchState,
    config: &DeskConfig,
    request: ImportRequest,
    prompt: &mut dyn MappingPrompt,
) -> ApiResult<IngestReport> {
    let ImportRequest {
        channel,
        category,
        ingested_on,
        sheets,
    } = request;

    let mut session = IngestSession::new(&channel, category, ingested_on, config.keywords.clone())?;
    let channel = session.channel().to_string();

    // The batch runs against a copy; the live workbench only changes once
    // the database has accepted the outcome.
    let mut staged = workbench.with_workbench(|w| w.clone());

    for named in sheets {
        let state = session.enqueue(&named.name, named.sheet, &staged.memory)?;
        debug!(file = %named.name, ?state, "enqueued");
    }

    let mut confirmed = Vec::new();
    let report = loop {
        let request = match session.advance(&mut staged.store) {
            IngestStep::Finished(report) => break report,
            IngestStep::NeedsMapping(request) => request,
        };

        let decision = prompt.decide(&request);
        match session.resolve(decision, &mut staged.memory) {
            Ok(Some(remembered)) => confirmed.push(remembered),
            Ok(None) => {}
            Err(CoreError::Validation(e)) => prompt.rejected(&e.to_string()),
            Err(e) => return Err(e.into()),
        }
    };

    for remembered in &confirmed {
        db.inner().mappings().upsert(remembered).await?;
    }

    let imported: Option<Vec<DomainRecord>> = (report.files_imported > 0).then(|| {
        staged
            .store
            .records()
            .iter()
            .filter(|r| r.channel == channel && r.category == category)
            .cloned()
            .collect()
    });
    if let Some(records) = &imported {
        db.inner().records().replace(&channel, category, records).await?;
        db.inner().channels().add(category, &channel).await?;
    }

    workbench.with_workbench_mut(|w| {
        for remembered in &confirmed {
            w.memory.remember(
                remembered.signature.as_str(),
                remembered.mapping,
                remembered.label.as_str(),
            );
        }
        if let Some(records) = imported {
            w.store.replace(&channel, category, records);
            w.store.add_channel(category, &channel);
        }
    });

    info!(
        channel = %channel,
        category = %category,
        files = report.files_imported,
        rows = report.rows_imported,
        mappings = confirmed.len(),
        "import persisted"
    );
    Ok(report)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::Desk;
    use arb_core::{Cell, ColumnMapping, ColumnRole, Sheet};
    use std::collections::VecDeque;

    /// Replays scripted decisions and records what it was shown.
    #[derive(Default)]
    struct ScriptedPrompt {
        decisions: VecDeque<MappingDecision>,
        shown: Vec<MappingRequest>,
        rejections: Vec<String>,
    }

    impl ScriptedPrompt {
        fn new(decisions: Vec<MappingDecision>) -> Self {
            ScriptedPrompt {
                decisions: decisions.into(),
                ..Default::default()
            }
        }
    }

    impl MappingPrompt for ScriptedPrompt {
        fn decide(&mut self, request: &MappingRequest) -> MappingDecision {
            self.shown.push(request.clone());
            self.decisions.pop_front().unwrap_or(MappingDecision::Skip)
        }

        fn rejected(&mut self, reason: &str) {
            self.rejections.push(reason.to_string());
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn market_sheet(name: &str, rows: &[(&str, f64)]) -> NamedSheet {
        let mut cells = vec![vec![Cell::from("货号"), Cell::from("得物价")]];
        cells.extend(rows.iter().map(|(sku, price)| vec![Cell::from(*sku), Cell::from(*price)]));
        NamedSheet::new(name, Sheet::new(cells))
    }

    fn odd_sheet(name: &str) -> NamedSheet {
        NamedSheet::new(
            name,
            Sheet::new(vec![
                vec![Cell::from("编号"), Cell::from("报价")],
                vec![Cell::from("DD1391-100"), Cell::from(1000.0)],
            ]),
        )
    }

    fn request(category: Category, sheets: Vec<NamedSheet>) -> ImportRequest {
        ImportRequest {
            channel: "Poizon".into(),
            category,
            ingested_on: date(),
            sheets,
        }
    }

    #[tokio::test]
    async fn test_auto_import_is_persisted() {
        let desk = Desk::in_memory().await.unwrap();
        let mut prompt = ScriptedPrompt::default();

        let report = import_sheets(
            &desk.db,
            &desk.workbench,
            &desk.config,
            request(
                Category::MarketPrice,
                vec![market_sheet("feb.json", &[("dd1391-100", 1299.0), ("DZ5485-612", 899.0)])],
            ),
            &mut prompt,
        )
        .await
        .unwrap();

        assert_eq!(report.files_imported, 1);
        assert_eq!(report.rows_imported, 2);
        assert!(prompt.shown.is_empty());

        let reloaded = desk.db.inner().load_store().await.unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.market_price("DD1391-100").cents(), 129_900);
        assert_eq!(reloaded.channels(Category::MarketPrice), ["Poizon".to_string()]);
    }

    #[tokio::test]
    async fn test_reimport_replaces_channel_records() {
        let desk = Desk::in_memory().await.unwrap();
        let mut prompt = ScriptedPrompt::default();

        for sheet in [
            market_sheet("feb.json", &[("A1", 100.0), ("B2", 200.0)]),
            market_sheet("mar.json", &[("C3", 300.0)]),
        ] {
            import_sheets(
                &desk.db,
                &desk.workbench,
                &desk.config,
                request(Category::MarketPrice, vec![sheet]),
                &mut prompt,
            )
            .await
            .unwrap();
        }

        let reloaded = desk.db.inner().load_store().await.unwrap();
        let skus: Vec<&str> = reloaded.records().iter().map(|r| r.sku.as_str()).collect();
        assert_eq!(skus, vec!["C3"]);
        assert_eq!(desk.workbench.with_workbench(|w| w.store.len()), 1);
    }

    #[tokio::test]
    async fn test_confirmed_mapping_is_remembered_and_reused() {
        let desk = Desk::in_memory().await.unwrap();
        let mapping = ColumnMapping::default()
            .with(ColumnRole::Sku, 0)
            .with(ColumnRole::Price, 1);
        let mut prompt = ScriptedPrompt::new(vec![MappingDecision::Confirm(mapping)]);

        let report = import_sheets(
            &desk.db,
            &desk.workbench,
            &desk.config,
            request(
                Category::MarketPrice,
                vec![odd_sheet("a.json"), odd_sheet("b.json")],
            ),
            &mut prompt,
        )
        .await
        .unwrap();

        // The twin file with the same header is resolved by the first answer
        assert_eq!(prompt.shown.len(), 1);
        assert_eq!(prompt.shown[0].missing, vec![ColumnRole::Sku, ColumnRole::Price]);
        assert_eq!(report.files_imported, 2);

        let stored = desk.db.inner().mappings().list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].signature, "编号|报价");
        assert_eq!(stored[0].label, "a.json");

        // A later batch with the same header needs no prompt
        let mut silent = ScriptedPrompt::default();
        import_sheets(
            &desk.db,
            &desk.workbench,
            &desk.config,
            request(Category::MarketPrice, vec![odd_sheet("c.json")]),
            &mut silent,
        )
        .await
        .unwrap();
        assert!(silent.shown.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_confirmation_is_asked_again() {
        let desk = Desk::in_memory().await.unwrap();
        let too_wide = ColumnMapping::default()
            .with(ColumnRole::Sku, 0)
            .with(ColumnRole::Price, 7);
        let mut prompt = ScriptedPrompt::new(vec![
            MappingDecision::Confirm(too_wide),
            MappingDecision::Skip,
        ]);

        let report = import_sheets(
            &desk.db,
            &desk.workbench,
            &desk.config,
            request(Category::MarketPrice, vec![odd_sheet("a.json")]),
            &mut prompt,
        )
        .await
        .unwrap();

        assert_eq!(prompt.rejections.len(), 1);
        assert_eq!(prompt.shown.len(), 2);
        assert_eq!(report.skipped_files, vec!["a.json"]);
        assert_eq!(report.files_imported, 0);
        assert_eq!(desk.db.inner().records().count().await.unwrap(), 0);
        assert!(desk.db.inner().channels().list(Category::MarketPrice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_sheet_aborts_batch() {
        let desk = Desk::in_memory().await.unwrap();
        let mut prompt = ScriptedPrompt::default();

        let err = import_sheets(
            &desk.db,
            &desk.workbench,
            &desk.config,
            request(
                Category::MarketPrice,
                vec![
                    market_sheet("ok.json", &[("A1", 100.0)]),
                    NamedSheet::new("empty.json", Sheet::default()),
                ],
            ),
            &mut prompt,
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::EmptySheet);
        assert_eq!(desk.workbench.with_workbench(|w| w.store.len()), 0);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_workbench_untouched() {
        let desk = Desk::in_memory().await.unwrap();
        let mapping = ColumnMapping::default()
            .with(ColumnRole::Sku, 0)
            .with(ColumnRole::Price, 1);
        let mut prompt = ScriptedPrompt::new(vec![MappingDecision::Confirm(mapping)]);
        desk.db.inner().close().await;

        let err = import_sheets(
            &desk.db,
            &desk.workbench,
            &desk.config,
            request(
                Category::MarketPrice,
                vec![odd_sheet("a.json"), market_sheet("feb.json", &[("A1", 100.0)])],
            ),
            &mut prompt,
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::DatabaseError);
        desk.workbench.with_workbench(|w| {
            assert!(w.store.is_empty());
            assert!(w.store.channels(Category::MarketPrice).is_empty());
            assert!(w.memory.is_empty());
        });
    }
}
