use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Validate a required text field: 1-`max` Unicode characters after trimming.
pub fn validate_required_text(value: &str, label: &str, max: usize) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{label} darf nicht leer sein")));
    }
    validate_max_len(value, label, max)
}

/// Validate an optional text field against a maximum length.
pub fn validate_optional_text(value: Option<&str>, label: &str, max: usize) -> Result<(), AppError> {
    match value {
        Some(v) => validate_max_len(v, label, max),
        None => Ok(()),
    }
}

fn validate_max_len(value: &str, label: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{label} darf höchstens {max} Zeichen lang sein"
        )));
    }
    Ok(())
}

/// Trim a text field and map blank input to `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
