//! # Narrative Summary
//!
//! Compact text handed to the narrative assistant.
//!
//! ```text
//! 1. DD1391-100 | cost ¥360.00 | market ¥2000.00 | profit ¥1400.00 | ROI 388.9% | sales 120 | Poizon
//! 2. FV5029-010 | cost ¥540.00 | market ¥0.00 | profit -¥540.00 | ROI 0.0% | sales 0 | no data
//! ```

use std::fmt::Write;

use crate::types::ArbitrageResult;

/// Most results ever sent to the assistant.
pub const SUMMARY_LIMIT: usize = 200;

/// Renders the top `limit` results (capped at [`SUMMARY_LIMIT`]), one line
/// each, in the order given.
pub fn render_summary(results: &[ArbitrageResult], limit: usize) -> String {
    let shown = limit.min(SUMMARY_LIMIT).min(results.len());
    let mut out = String::new();

    for (rank, r) in results.iter().take(shown).enumerate() {
        // writing into a String cannot fail
        let _ = writeln!(
            out,
            "{}. {} | cost {} | market {} | profit {} | ROI {:.1}% | sales {} | {}",
            rank + 1,
            r.sku,
            r.cost_price,
            r.market_price,
            r.profit,
            r.roi * 100.0,
            r.sales_volume,
            r.source_label,
        );
    }

    if shown < results.len() {
        let _ = writeln!(out, "({} more results not shown)", results.len() - shown);
    }
    out
}
