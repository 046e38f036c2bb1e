//! # Mapping Commands
//!
//! Lists and forgets remembered column mappings.

use tracing::info;

use arb_core::RememberedMapping;

use crate::error::{ApiError, ApiResult};
use crate::state::{DbState, WorkbenchState};

/// Every remembered mapping, sorted by header signature.
pub fn list_mappings(workbench: &WorkbenchState) -> Vec<RememberedMapping> {
    workbench.with_workbench(|w| w.memory.entries().into_iter().cloned().collect())
}

/// Forgets the mapping for one header signature.
///
/// The next file with that header is treated as unseen again.
pub async fn forget_mapping(
    db: &DbState,
    workbench: &WorkbenchState,
    signature: &str,
) -> ApiResult<()> {
    let known = workbench.with_workbench(|w| w.memory.lookup(signature).is_some());
    if !known {
        return Err(ApiError::not_found("Mapping", signature));
    }
    db.inner().mappings().delete(signature).await?;
    workbench.with_workbench_mut(|w| w.memory.forget(signature));

    info!(signature = %signature, "mapping forgotten");
    Ok(())
}

/// Forgets every mapping. Returns how many were dropped.
pub async fn clear_mappings(db: &DbState, workbench: &WorkbenchState) -> ApiResult<usize> {
    db.inner().mappings().clear().await?;
    let count = workbench.with_workbench_mut(|w| {
        let count = w.memory.len();
        w.memory.clear();
        count
    });
    Ok(count)
}
