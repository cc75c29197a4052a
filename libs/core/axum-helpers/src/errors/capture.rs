//! Error-capture pipeline.
//!
//! Handlers signal an unhandled failure by returning [`AppError::Internal`]
//! (or by panicking, when [`handle_panic`] is installed through
//! `tower_http::catch_panic::CatchPanicLayer::custom`). Either way the 500
//! response carries an [`UnhandledError`] extension. The [`capture_errors`]
//! middleware sits outside the handler stack, notices the extension, emails
//! the operator through [`ErrorCapture::handle`] and replaces the response
//! with an [`ErrorCaptureResponse`].
//!
//! [`AppError::Internal`]: super::AppError::Internal

use super::codes::ErrorCode;
use super::stack::format_stack_trace;
use super::ErrorResponse;
use crate::http::request::{
    body_to_json, headers_to_json, query_to_json, redact_query, request_url,
};
use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Local;
use core_config::Environment;
use notifications::{EmailDispatch, SERVER_ERROR_TEMPLATE, sanitize};
use serde::Serialize;
use serde_json::{Value, json};
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use tracing::{error, instrument};

/// Subject of the operator notification.
pub const ERROR_EMAIL_SUBJECT: &str = "Application Error";

/// Request bodies above this size are not captured.
pub const MAX_CAPTURED_BODY: usize = 64 * 1024;

const TIMESTAMP_FORMAT: &str = "%B %-d, %Y, %-I:%M:%S %p";

/// A failure no handler dealt with.
#[derive(Debug, Clone)]
pub struct UnhandledError {
    message: String,
    backtrace: Option<String>,
}

impl UnhandledError {
    /// Records `message` together with the current backtrace.
    pub fn new(message: impl Into<String>) -> Self {
        let backtrace = Backtrace::force_capture();
        let backtrace = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };

        Self {
            message: message.into(),
            backtrace,
        }
    }

    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "Handler panicked".to_string()
        };

        Self::new(message)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn backtrace(&self) -> Option<&str> {
        self.backtrace.as_deref()
    }
}

impl fmt::Display for UnhandledError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl IntoResponse for UnhandledError {
    /// A generic 500 that still works without [`capture_errors`] installed.
    fn into_response(self) -> Response {
        error!(
            error_code = ErrorCode::InternalError.code(),
            "Internal server error: {}",
            self.message
        );

        let body = Json(ErrorResponse::new(
            ErrorCode::InternalError,
            ErrorCode::InternalError.default_message(),
        ));
        let mut response = (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// `CatchPanicLayer::custom` handler that turns a panic into an unhandled error.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    UnhandledError::from_panic(payload).into_response()
}

/// What the operator is told about the failing request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub method: String,
    pub url: String,
    pub headers: Value,
    pub query: Value,
    pub body: Value,
}

impl RequestContext {
    pub async fn from_request_parts(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Option<Bytes>,
    ) -> Self {
        let body = match body {
            Some(bytes) => body_to_json(headers, bytes).await,
            None => Value::Null,
        };

        Self {
            method: method.to_string(),
            url: request_url(uri, headers),
            headers: headers_to_json(headers),
            query: query_to_json(uri),
            body,
        }
    }

    /// Copy with the URL's query, headers, query and body passed through the
    /// sanitizer.
    pub fn sanitized(&self) -> Self {
        Self {
            method: self.method.clone(),
            url: redact_query(&self.url),
            headers: sanitize(&self.headers),
            query: sanitize(&self.query),
            body: sanitize(&self.body),
        }
    }
}

/// Body sent to the client after an unhandled failure.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorCaptureResponse {
    pub status: bool,
    pub message: String,
    pub response_code: u16,
}

impl ErrorCaptureResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
            response_code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        }
    }

    pub fn generic() -> Self {
        Self::new(ErrorCode::InternalError.default_message())
    }
}

impl IntoResponse for ErrorCaptureResponse {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

/// Reports unhandled failures to the operator by email.
#[derive(Debug, Clone)]
pub struct ErrorCapture {
    email: EmailDispatch,
    operator_email: String,
    environment: Environment,
}

impl ErrorCapture {
    pub fn new(
        email: EmailDispatch,
        operator_email: impl Into<String>,
        environment: Environment,
    ) -> Self {
        Self {
            email,
            operator_email: operator_email.into(),
            environment,
        }
    }

    /// Log `error`, notify the operator and build the client response.
    ///
    /// Never fails. A notification failure is logged and answered with the
    /// generic message whatever the environment.
    #[instrument(skip_all, fields(method = %request.method, url = %redact_query(&request.url)))]
    pub async fn handle(
        &self,
        error: &UnhandledError,
        request: &RequestContext,
    ) -> ErrorCaptureResponse {
        let request = request.sanitized();
        error!(
            error = %error.message,
            headers = %request.headers,
            query = %request.query,
            body = %request.body,
            "Unhandled server error"
        );

        let context = notification_context(error, &request);
        let recipients = [self.operator_email.clone()];

        match self
            .email
            .send(
                ERROR_EMAIL_SUBJECT,
                SERVER_ERROR_TEMPLATE,
                &recipients,
                &context,
                &[],
            )
            .await
        {
            Ok(()) if self.environment.is_production() => ErrorCaptureResponse::generic(),
            Ok(()) => ErrorCaptureResponse::new(error.message.clone()),
            Err(err) => {
                error!(error = %err, "Failed to send error notification email");
                ErrorCaptureResponse::generic()
            }
        }
    }
}

fn notification_context(error: &UnhandledError, request: &RequestContext) -> Value {
    json!({
        "errorCode": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        "errorMessage": error.message,
        "timestamp": Local::now().format(TIMESTAMP_FORMAT).to_string(),
        "stackTrace": format_stack_trace(&error.message, error.backtrace()),
        "requestMethod": request.method,
        "requestUrl": request.url,
        "requestHeaders": pretty(&request.headers),
        "requestQuery": pretty(&request.query),
        "requestBody": pretty(&request.body),
    })
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Middleware that routes responses marked with [`UnhandledError`] through
/// [`ErrorCapture::handle`].
///
/// Request bodies with a declared length up to [`MAX_CAPTURED_BODY`] are
/// buffered so they can be included in the report.
pub async fn capture_errors(
    State(capture): State<ErrorCapture>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();
    let uri = parts.uri.clone();
    let headers = parts.headers.clone();

    let (body, captured) = if declared_length(&headers).is_some_and(|len| len <= MAX_CAPTURED_BODY)
    {
        match axum::body::to_bytes(body, MAX_CAPTURED_BODY).await {
            Ok(bytes) => (Body::from(bytes.clone()), Some(bytes)),
            Err(err) => {
                return super::AppError::BadRequest(format!("Failed to read request body: {err}"))
                    .into_response();
            }
        }
    } else {
        (body, None)
    };

    let response = next.run(Request::from_parts(parts, body)).await;

    let Some(error) = response.extensions().get::<UnhandledError>().cloned() else {
        return response;
    };

    let context = RequestContext::from_request_parts(&method, &uri, &headers, captured).await;
    capture.handle(&error, &context).await.into_response()
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}
