//! # Validation Module
//!
//! Checks on user-supplied values before they reach the workbench.
//!
//! Row-level anomalies in sheets are not validated here; the extractor
//! records those as `RowProblem`s.

use crate::error::ValidationError;
use crate::mapping::{ColumnMapping, ColumnRole};

/// Maximum channel name length.
pub const MAX_CHANNEL_NAME_LENGTH: usize = 64;

/// Validates a channel name.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - Must be at most 64 characters
pub fn validate_channel_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "channel".to_string(),
        });
    }

    if name.chars().count() > MAX_CHANNEL_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "channel".to_string(),
            max: MAX_CHANNEL_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates a confirmed mapping against the header it was made for.
///
/// ## Rules
/// - The SKU column must be mapped
/// - Every mapped column must exist in the header
pub fn validate_mapping_for_header(
    mapping: &ColumnMapping,
    header_width: usize,
) -> Result<(), ValidationError> {
    if mapping.sku.is_none() {
        return Err(ValidationError::Required {
            field: "sku column".to_string(),
        });
    }

    for role in ColumnRole::ALL {
        if let Some(col) = mapping.get(role) {
            if col >= header_width {
                return Err(ValidationError::OutOfRange {
                    field: format!("{} column", role),
                    min: 0,
                    max: header_width as i64 - 1,
                });
            }
        }
    }

    Ok(())
}
