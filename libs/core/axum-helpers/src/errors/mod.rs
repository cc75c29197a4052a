pub mod capture;
pub mod codes;
pub mod handlers;
pub mod stack;

pub use capture::{ErrorCapture, ErrorCaptureResponse, RequestContext, UnhandledError};
pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use notifications::NotificationError;
use serde::Serialize;
use thiserror::Error;

/// Standard error response structure.
///
/// Returned for every client-class failure:
/// - `code`: Integer error code for logging/monitoring (e.g., 1004)
/// - `error`: Machine-readable error identifier (e.g., "NOT_FOUND")
/// - `message`: Human-readable error message
/// - `details`: Optional additional error details
///
/// # JSON Example
///
/// ```json
/// {
///   "code": 1004,
///   "error": "NOT_FOUND",
///   "message": "Resource not found"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: i32,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            error: code.as_str().to_string(),
            message: message.into(),
            details: None,
        }
    }
}

/// Application error type that can be converted to HTTP responses.
///
/// Every variant except [`AppError::Internal`] is answered directly. An
/// internal error is an *unhandled failure*: the response carries an
/// [`UnhandledError`] extension that the error-capture middleware turns into
/// an operator notification.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal Server Error: {0}")]
    Internal(UnhandledError),
}

impl AppError {
    /// An unhandled failure with a backtrace captured at this call site.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(UnhandledError::new(message))
    }
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::InvalidPhoneNumber(_) => Self::BadRequest(err.to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!(
                    error_code = ErrorCode::JsonExtraction.code(),
                    "JSON extraction error: {:?}",
                    e
                );
                (e.status(), ErrorCode::JsonExtraction, e.body_text())
            }
            AppError::BadRequest(msg) => {
                tracing::info!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, ErrorCode::BadRequest, msg)
            }
            AppError::NotFound(msg) => {
                tracing::info!(error_code = ErrorCode::NotFound.code(), "Not found: {}", msg);
                (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg)
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorCode::ServiceUnavailable,
                    msg,
                )
            }
            AppError::Internal(unhandled) => return unhandled.into_response(),
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, body::to_bytes, extract::Request, routing::post};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_response_body() {
        let response = AppError::NotFound("Resource not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["code"], 1004);
        assert_eq!(body["error"], "NOT_FOUND");
        assert_eq!(body["message"], "Resource not found");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_json_rejection_uses_error_envelope() {
        async fn echo(
            payload: Result<Json<Value>, JsonRejection>,
        ) -> Result<Json<Value>, AppError> {
            let Json(value) = payload?;
            Ok(Json(value))
        }

        let app = Router::new().route("/echo", post(echo));
        let request = Request::builder()
            .method("POST")
            .uri("/echo")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], 1003);
        assert_eq!(body["error"], "JSON_EXTRACTION");
    }

    #[tokio::test]
    async fn test_internal_error_hides_message_and_marks_response() {
        let response = AppError::internal("db password is hunter2").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let unhandled = response.extensions().get::<UnhandledError>().cloned().unwrap();
        assert_eq!(unhandled.message(), "db password is hunter2");

        let body = body_json(response).await;
        assert_eq!(body["message"], ErrorCode::InternalError.default_message());
    }

    #[test]
    fn test_invalid_phone_number_is_bad_request() {
        let err: AppError = NotificationError::InvalidPhoneNumber("abc".into()).into();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err: AppError = NotificationError::send("twilio", "timeout").into();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
