//! Phone number normalization to an E.164-like international form.

use crate::error::CoreError;

/// Country calling code applied to national numbers written with a leading zero.
pub const DEFAULT_COUNTRY_CODE: &str = "90";

/// Minimum number of digits after the `+` (shortest real-world E.164 numbers).
const MIN_DIGITS: usize = 8;

/// Maximum number of digits after the `+` allowed by E.164.
const MAX_DIGITS: usize = 15;

/// Normalize a user-entered phone number.
///
/// - Spaces, dashes, dots and parentheses are stripped.
/// - `+...` passes through unchanged.
/// - `0...` (national format) has the leading zero replaced by `+{country_code}`.
/// - Any other all-digit input is taken to already include a country code.
///
/// The result must be `+` followed by 8 to 15 digits.
pub fn normalize_phone(raw: &str, country_code: &str) -> Result<String, CoreError> {
    let compact: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    if compact.is_empty() {
        return Err(CoreError::Validation("Phone number is required".into()));
    }

    let normalized = if compact.starts_with('+') {
        compact
    } else if let Some(national) = compact.strip_prefix('0') {
        format!("+{country_code}{national}")
    } else {
        format!("+{compact}")
    };

    let digits = &normalized[1..];
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::Validation(format!(
            "Phone number '{raw}' contains invalid characters"
        )));
    }
    if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits.len()) {
        return Err(CoreError::Validation(format!(
            "Phone number '{raw}' must have between {MIN_DIGITS} and {MAX_DIGITS} digits"
        )));
    }

    Ok(normalized)
}
