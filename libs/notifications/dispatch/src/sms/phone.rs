//! Best-effort phone number normalization per provider.
//!
//! Numbers are cleaned of common separators and checked to be digits with
//! an optional leading `+`; nothing beyond that is validated.

use crate::error::{NotificationError, NotificationResult};

pub const DEFAULT_COUNTRY_CODE: &str = "234";

fn clean(number: &str) -> NotificationResult<String> {
    let cleaned: String = number
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect();

    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(NotificationError::InvalidPhoneNumber(number.to_string()));
    }

    Ok(cleaned)
}

/// E.164 form: `+<country code><subscriber>`.
///
/// A leading trunk `0` is replaced by the country code.
pub fn to_e164(number: &str, country_code: &str) -> NotificationResult<String> {
    let cleaned = clean(number)?;

    if cleaned.starts_with('+') {
        Ok(cleaned)
    } else if let Some(local) = cleaned.strip_prefix('0') {
        Ok(format!("+{country_code}{local}"))
    } else if cleaned.starts_with(country_code) {
        Ok(format!("+{cleaned}"))
    } else {
        Ok(format!("+{country_code}{cleaned}"))
    }
}

/// International form without the leading `+`.
pub fn without_plus(number: &str) -> NotificationResult<String> {
    let cleaned = clean(number)?;
    Ok(cleaned.strip_prefix('+').unwrap_or(&cleaned).to_string())
}

/// `number` with every digit except the last four replaced by `*`.
///
/// Numbers with four digits or fewer are masked entirely.
pub fn mask(number: &str) -> String {
    let digits = number.chars().filter(char::is_ascii_digit).count();
    let hidden = if digits > 4 { digits - 4 } else { digits };

    let mut seen = 0;
    number
        .chars()
        .map(|c| {
            if !c.is_ascii_digit() {
                return c;
            }
            seen += 1;
            if seen <= hidden { '*' } else { c }
        })
        .collect()
}
