use crate::state::AppState;
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use axum_helpers::{
    capture_errors, handle_panic, health_router, log_requests, not_found, security_headers,
};
use tower_http::{catch_panic::CatchPanicLayer, compression::CompressionLayer, trace::TraceLayer};

pub mod notifications;
pub mod payments;

async fn index() -> &'static str {
    "Cedar API"
}

/// Full application router.
///
/// Panics are converted into unhandled errors before the capture layer sees
/// the response, so both paths end in an operator email.
pub fn router(state: AppState) -> Router {
    let capture = state.error_capture();
    let app_info = state.config.app;

    Router::new()
        .route("/", get(index))
        .nest("/notifications", notifications::router())
        .nest("/payments", payments::router())
        .with_state(state)
        .merge(health_router(app_info))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn_with_state(capture, capture_errors))
        .layer(from_fn(security_headers))
        .layer(from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
}
