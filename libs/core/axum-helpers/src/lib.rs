//! # Axum Helpers
//!
//! Shared building blocks for Cedar's Axum services.
//!
//! ## Modules
//!
//! - **[`errors`]**: Structured error responses and the error-capture pipeline
//! - **[`http`]**: Request logging, security headers, request-to-JSON helpers
//! - **[`server`]**: Server start-up, health endpoint, graceful shutdown
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::{Router, middleware::from_fn_with_state};
//! use axum_helpers::{ErrorCapture, capture_errors, handle_panic, create_app};
//! use tower_http::catch_panic::CatchPanicLayer;
//!
//! let app = Router::new()
//!     .route("/", get(handler))
//!     .layer(CatchPanicLayer::custom(handle_panic))
//!     .layer(from_fn_with_state(capture, capture_errors));
//!
//! create_app(app, &ServerConfig::default()).await?;
//! ```

pub mod errors;
pub mod http;
pub mod server;

pub use errors::capture::{capture_errors, handle_panic};
pub use errors::handlers::not_found;
pub use errors::{
    AppError, ErrorCapture, ErrorCaptureResponse, ErrorCode, ErrorResponse, RequestContext,
    UnhandledError,
};
pub use http::{log_requests, security_headers};
pub use server::{HealthResponse, create_app, health_router, shutdown_signal};
