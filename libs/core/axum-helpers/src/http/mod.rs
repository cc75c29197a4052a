//! HTTP middleware and request helpers.
//!
//! ```ignore
//! use axum_helpers::http::{log_requests, security_headers};
//!
//! let app = Router::new()
//!     .layer(axum::middleware::from_fn(security_headers))
//!     .layer(axum::middleware::from_fn(log_requests));
//! ```

pub mod logging;
pub mod request;
pub mod security;

pub use logging::log_requests;
pub use security::security_headers;
