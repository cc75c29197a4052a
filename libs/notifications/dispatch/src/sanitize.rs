//! Redaction of sensitive fields before data reaches logs or outbound email.

use serde_json::{Map, Value};

/// Marker written in place of a redacted value.
pub const REDACTED: &str = "***";

/// Key fragments that mark a field as sensitive.
///
/// Matching is a case-insensitive substring test against the key, so
/// `userEmail` and `Email_Address` both match `email`.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "authorization",
    "apikey",
    "api_key",
    "creditcard",
    "credit_card",
    "cardnumber",
    "card_number",
    "ssn",
    "accesstoken",
    "refreshtoken",
    "phonenumber",
    "email",
    "address",
];

/// Returns whether `key` names a sensitive field.
pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_lowercase();
    SENSITIVE_FIELDS.iter().any(|field| key.contains(field))
}

/// Returns a redacted deep copy of `value`.
///
/// Object and array shapes are preserved. Values under sensitive keys are
/// replaced with [`REDACTED`] whatever their type; everything else is copied
/// unchanged. The input is never modified.
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        Value::Object(map) => {
            let sanitized: Map<String, Value> = map
                .iter()
                .map(|(key, value)| {
                    let value = if is_sensitive_key(key) {
                        Value::String(REDACTED.to_string())
                    } else {
                        sanitize(value)
                    };
                    (key.clone(), value)
                })
                .collect();
            Value::Object(sanitized)
        }
        other => other.clone(),
    }
}
