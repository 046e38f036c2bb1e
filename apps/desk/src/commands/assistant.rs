//! # Assistant Commands
//!
//! Opens a chat about a set of match results.

use std::sync::Arc;
use tracing::info;

use arb_core::{render_summary, ArbitrageResult};

use crate::assistant::{ChatSession, HttpAssistant, NarrativeAssistant};
use crate::error::{ApiError, ApiResult};
use crate::state::DeskConfig;

/// Builds the summary the assistant sees: the top results, one line each.
pub fn summarize(config: &DeskConfig, results: &[ArbitrageResult]) -> String {
    render_summary(results, config.matching.summary_limit)
}

/// Opens a chat against the configured HTTP assistant.
pub fn open_chat(config: &DeskConfig, results: &[ArbitrageResult]) -> ApiResult<ChatSession> {
    let assistant =
        HttpAssistant::new(&config.assistant).map_err(|e| ApiError::assistant(e.to_string()))?;
    Ok(open_chat_with(Arc::new(assistant), config, results))
}

/// Opens a chat against any assistant implementation.
pub fn open_chat_with(
    assistant: Arc<dyn NarrativeAssistant>,
    config: &DeskConfig,
    results: &[ArbitrageResult],
) -> ChatSession {
    let summary = summarize(config, results);
    info!(
        results = results.len(),
        lines = summary.lines().count(),
        "chat opened"
    );
    ChatSession::new(assistant, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::AssistantError;
    use crate::error::ErrorCode;
    use arb_core::{DiscountFactor, Money};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct CountingAssistant;

    #[async_trait]
    impl NarrativeAssistant for CountingAssistant {
        async fn ask(&self, summary: &str, _: &str) -> Result<String, AssistantError> {
            Ok(format!("{}", summary.lines().filter(|l| l.contains(" | ")).count()))
        }
    }

    fn result(sku: &str, profit: i64) -> ArbitrageResult {
        ArbitrageResult {
            sku: sku.into(),
            size: "-".into(),
            tag_price: Money::from_cents(10_000),
            discount: DiscountFactor::full_price(),
            cost_price: Money::from_cents(10_000),
            market_price: Money::from_cents(10_000 + profit),
            net_revenue: Money::from_cents(10_000 + profit),
            profit: Money::from_cents(profit),
            roi: profit as f64 / 10_000.0,
            source_label: "Poizon".into(),
            source_file: "feb.json".into(),
            inventory_qty: 0,
            futures_qty: 0,
            sales_volume: 1,
            sales_history: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_summary_respects_configured_limit() {
        let mut config = DeskConfig::default();
        config.matching.summary_limit = 3;
        let results: Vec<_> = (0..10).map(|i| result(&format!("SKU-{}", i), 1000 - i)).collect();

        let chat = open_chat_with(Arc::new(CountingAssistant), &config, &results);
        let reply = chat.ask("how many?").await.unwrap();

        assert_eq!(reply.text, "3");
        assert!(chat.summary().starts_with("1. SKU-0 |"));
    }

    #[test]
    fn test_open_chat_without_url() {
        let err = open_chat(&DeskConfig::default(), &[]).err().unwrap();
        assert_eq!(err.code, ErrorCode::AssistantError);
    }
}
