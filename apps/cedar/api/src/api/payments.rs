use crate::state::AppState;
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    routing::{get, post},
};
use axum_helpers::AppError;
use notifications::{PaymentDispatch, PaymentOptions, PaymentSession, PaymentStatus};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    /// Major units, e.g. `50.00`.
    pub amount: f64,
    pub currency: String,
    pub email: String,
    pub reference: String,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub options: Option<PaymentOptions>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(initiate_payment))
        .route("/{reference}", get(verify_payment))
}

fn gateway(state: &AppState) -> Result<&PaymentDispatch, AppError> {
    state
        .payments
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("Payments are not configured".to_string()))
}

async fn initiate_payment(
    State(state): State<AppState>,
    payload: Result<Json<InitiatePaymentRequest>, JsonRejection>,
) -> Result<Json<PaymentSession>, AppError> {
    let Json(request) = payload?;
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(AppError::BadRequest(
            "amount must be a positive number".to_string(),
        ));
    }

    let session = gateway(&state)?
        .initiate_payment(
            request.amount,
            &request.currency,
            &request.email,
            &request.reference,
            request.metadata.as_ref(),
            request.options.as_ref(),
        )
        .await?;

    Ok(Json(session))
}

async fn verify_payment(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<PaymentStatus>, AppError> {
    let status = gateway(&state)?.verify_payment(&reference).await?;
    Ok(Json(status))
}
