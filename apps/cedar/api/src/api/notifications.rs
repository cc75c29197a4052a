use crate::state::AppState;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};
use axum_helpers::AppError;
use notifications::{PushData, PushPlatform, SmsReceipt};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SmsRequest {
    pub message: String,
    pub phone_number: String,
}

#[derive(Debug, Deserialize)]
pub struct PushRequest {
    pub platform: String,
    pub title: String,
    pub body: String,
    pub token: String,
    #[serde(default)]
    pub data: Option<PushData>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sms", post(send_sms))
        .route("/push", post(send_push))
}

async fn send_sms(
    State(state): State<AppState>,
    payload: Result<Json<SmsRequest>, JsonRejection>,
) -> Result<Json<SmsReceipt>, AppError> {
    let Json(request) = payload?;
    let receipt = state
        .sms
        .send(&request.message, &request.phone_number)
        .await?;
    Ok(Json(receipt))
}

async fn send_push(
    State(state): State<AppState>,
    payload: Result<Json<PushRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(request) = payload?;
    let push = state.push.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable("Push notifications are not configured".to_string())
    })?;
    let platform =
        PushPlatform::parse(&request.platform).map_err(|e| AppError::BadRequest(e.to_string()))?;

    push.platform(platform)
        .send(
            &request.title,
            &request.body,
            &request.token,
            request.data.as_ref(),
        )
        .await?;

    Ok(StatusCode::ACCEPTED)
}
