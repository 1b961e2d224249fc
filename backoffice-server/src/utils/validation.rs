//! Input validation helpers
//!
//! Centralized text length constants and validation functions. Every helper
//! reports the offending field so clients can highlight it.

use sqlx::SqlitePool;

use crate::db::repository::{IdTable, find_missing_ids};
use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Slugs, role names, module names, usernames
pub const MAX_NAME_LEN: usize = 100;

/// Display labels and permission names
pub const MAX_LABEL_LEN: usize = 200;

/// Descriptions
pub const MAX_NOTE_LEN: usize = 500;

/// Icon identifiers
pub const MAX_ICON_LEN: usize = 100;

/// URLs / route paths
pub const MAX_URL_LEN: usize = 2048;

/// Passwords (before hashing)
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_field(field, format!("{field} is required")));
    }
    check_len(value, field, max_len)
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    match value {
        Some(v) => check_len(v, field, max_len),
        None => Ok(()),
    }
}

/// Same as [`validate_optional_text`] for nullable partial-update fields.
pub fn validate_nullable_text(
    value: &Option<Option<String>>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    match value {
        Some(Some(v)) => check_len(v, field, max_len),
        _ => Ok(()),
    }
}

/// Validate a slug: ASCII letters, digits, `-` and `_`.
pub fn validate_slug(value: &str, field: &str) -> Result<(), AppError> {
    validate_required_text(value, field, MAX_NAME_LEN)?;
    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(AppError::invalid_field(
            field,
            format!("{field} may only contain letters, digits, '-' and '_'"),
        ));
    }
    Ok(())
}

/// Validate a list of referenced ids: every id must be positive.
pub fn validate_ids(ids: &[i64], field: &str) -> Result<(), AppError> {
    if let Some(bad) = ids.iter().find(|id| **id <= 0) {
        return Err(AppError::invalid_field(
            field,
            format!("{field} contains an invalid id: {bad}"),
        ));
    }
    Ok(())
}

/// Remove duplicate ids, keeping the first occurrence.
pub fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// All-or-nothing existence check of referenced ids.
///
/// Missing ids are listed in the message and in `details.missing_ids`.
pub async fn ensure_ids_exist(
    pool: &SqlitePool,
    table: IdTable,
    ids: &[i64],
    field: &str,
) -> Result<(), AppError> {
    let missing = find_missing_ids(pool, table, ids).await?;
    if missing.is_empty() {
        return Ok(());
    }

    let listed = missing
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(
        AppError::invalid_field(field, format!("{field} references unknown ids: {listed}"))
            .with_detail("missing_ids", missing),
    )
}

fn check_len(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len > max_len {
        return Err(AppError::invalid_field(
            field,
            format!("{field} is too long ({len} chars, max {max_len})"),
        ));
    }
    Ok(())
}
