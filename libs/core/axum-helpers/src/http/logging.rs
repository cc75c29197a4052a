use axum::{extract::Request, middleware::Next, response::Response};
use notifications::sanitize;
use std::time::Instant;
use tracing::{error, info, warn};

use super::request::{headers_to_json, query_to_json};

/// Logs every completed request with sanitized headers and query.
///
/// Server errors are logged at `error`, client errors at `warn`, anything
/// else at `info`.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let headers = sanitize(&headers_to_json(request.headers()));
    let query = sanitize(&query_to_json(request.uri()));

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;

    if status >= 500 {
        error!(%method, %path, status, latency_ms, %headers, %query, "Server error response");
    } else if status >= 400 {
        warn!(%method, %path, status, latency_ms, %headers, %query, "Client error response");
    } else {
        info!(%method, %path, status, latency_ms, %headers, %query, "Successful response");
    }

    response
}
