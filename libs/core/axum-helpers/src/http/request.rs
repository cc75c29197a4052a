//! Conversions from request parts to JSON for logs and error reports.

use axum::{
    Form,
    body::{Body, Bytes},
    extract::{FromRequest, Query, Request},
    http::{HeaderMap, Uri, header},
};
use notifications::sanitize::{REDACTED, is_sensitive_key};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;
use url::form_urlencoded;

/// Header names mapped to their values; repeated headers are joined with `", "`.
pub fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for name in headers.keys() {
        let value = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        map.insert(name.as_str().to_string(), Value::String(value));
    }
    Value::Object(map)
}

/// Query parameters as a flat object. An unparseable query yields `{}`.
pub fn query_to_json(uri: &Uri) -> Value {
    let params = Query::<BTreeMap<String, String>>::try_from_uri(uri)
        .map(|Query(params)| params)
        .unwrap_or_default();

    Value::Object(
        params
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
    )
}

/// Absolute URL when a `Host` header is present, otherwise the path and query.
pub fn request_url(uri: &Uri, headers: &HeaderMap) -> String {
    if uri.scheme().is_some() {
        return uri.to_string();
    }

    let path = uri
        .path_and_query()
        .map(|path| path.as_str())
        .unwrap_or("/");

    match headers.get(header::HOST).and_then(|host| host.to_str().ok()) {
        Some(host) => {
            let scheme = headers
                .get("x-forwarded-proto")
                .and_then(|proto| proto.to_str().ok())
                .unwrap_or("http");
            format!("{scheme}://{host}{path}")
        }
        None => path.to_string(),
    }
}

/// `url` with the value of every sensitive query parameter redacted.
///
/// The query is re-encoded in its original order; anything before the `?`
/// is kept as is.
pub fn redact_query(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let pairs = form_urlencoded::parse(query.as_bytes()).map(|(key, value)| {
        let value = if is_sensitive_key(&key) {
            Cow::Borrowed(REDACTED)
        } else {
            value
        };
        (key, value)
    });
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();

    if query.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{query}")
    }
}

/// Decodes a buffered body according to its `Content-Type`.
///
/// JSON and URL-encoded forms become structured values; other UTF-8 bodies
/// are kept as a string. Empty and binary bodies become `null`.
pub async fn body_to_json(headers: &HeaderMap, bytes: Bytes) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        if let Ok(value) = serde_json::from_slice(&bytes) {
            return value;
        }
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        if let Some(form) = decode_form(bytes.clone()).await {
            return form;
        }
    }

    match std::str::from_utf8(&bytes) {
        Ok(text) => Value::String(text.to_string()),
        Err(_) => Value::Null,
    }
}

async fn decode_form(bytes: Bytes) -> Option<Value> {
    let request = Request::builder()
        .method("POST")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(bytes))
        .ok()?;

    let Form(fields) = Form::<BTreeMap<String, String>>::from_request(request, &())
        .await
        .ok()?;

    Some(Value::Object(
        fields
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect(),
    ))
}
