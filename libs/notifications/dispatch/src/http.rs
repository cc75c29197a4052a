//! Response handling shared by the HTTP-based adapters.

use crate::error::{NotificationError, NotificationResult};
use reqwest::Response;
use serde_json::Value;

/// Body of a provider response as JSON, falling back to a string for
/// non-JSON bodies and `null` for empty ones.
fn parse_body(body: String) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

/// Read a delivery response (email, SMS, push), failing on non-2xx statuses.
pub(crate) async fn delivery_response(
    provider: &'static str,
    response: Response,
) -> NotificationResult<Value> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| NotificationError::send(provider, e.to_string()))?;

    if !status.is_success() {
        return Err(NotificationError::send(provider, format!("{status}: {body}")));
    }

    Ok(parse_body(body))
}

/// Read a payment gateway response, keeping the body on failure.
pub(crate) async fn gateway_response(
    provider: &'static str,
    response: Response,
) -> NotificationResult<Value> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| NotificationError::provider(provider, e.to_string(), None))?;
    let payload = parse_body(body);

    if !status.is_success() {
        let message = error_message(&payload).unwrap_or_else(|| status.to_string());
        return Err(NotificationError::provider(provider, message, Some(payload)));
    }

    Ok(payload)
}

/// Gateways report failures as `{message}` or `{error: {message}}`.
fn error_message(payload: &Value) -> Option<String> {
    payload
        .get("message")
        .or_else(|| payload.get("error").and_then(|error| error.get("message")))
        .and_then(Value::as_str)
        .map(str::to_string)
}
