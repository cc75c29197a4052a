//! Application state shared by every handler.
//!
//! Facades are built once at start-up and cloned per request (Arc clones).

use crate::config::Config;
use axum_helpers::ErrorCapture;
use core_config::env_optional;
use notifications::{
    EmailDispatch, FcmClient, PaymentDispatch, PushDispatch, PushGateway, PushPlatform,
    SmsDispatch, TemplateRenderer,
};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub email: EmailDispatch,
    pub sms: SmsDispatch,
    /// `None` when `PAYMENT_SERVICE_TYPE` is unset.
    pub payments: Option<PaymentDispatch>,
    /// `None` when `FIREBASE_PROJECT_ID` is unset.
    pub push: Option<PushChannels>,
}

impl AppState {
    pub fn from_config(config: Config) -> eyre::Result<Self> {
        let renderer = Arc::new(TemplateRenderer::new()?);

        let email = EmailDispatch::from_env(renderer)?;
        let sms = SmsDispatch::from_env()?;
        let payments = PaymentDispatch::from_env()?;
        let push = match env_optional("FIREBASE_PROJECT_ID") {
            Some(_) => Some(PushChannels::from_env(Arc::new(FcmClient::from_env()?))),
            None => None,
        };

        info!(
            email = email.provider_name(),
            sms = sms.provider_name(),
            payments = payments.as_ref().map(|p| p.provider_name()),
            push = push.is_some(),
            "Notification channels configured"
        );

        Ok(Self {
            config,
            email,
            sms,
            payments,
            push,
        })
    }

    /// Error-capture pipeline reporting to the configured operator address.
    pub fn error_capture(&self) -> ErrorCapture {
        ErrorCapture::new(
            self.email.clone(),
            self.config.error_notification_email.clone(),
            self.config.environment,
        )
    }
}

/// One push facade per platform over a shared gateway.
#[derive(Clone)]
pub struct PushChannels {
    web: PushDispatch,
    android: PushDispatch,
    ios: PushDispatch,
}

impl PushChannels {
    pub fn from_env(gateway: Arc<dyn PushGateway>) -> Self {
        Self {
            web: PushDispatch::from_env(PushPlatform::Web, gateway.clone()),
            android: PushDispatch::from_env(PushPlatform::Android, gateway.clone()),
            ios: PushDispatch::from_env(PushPlatform::Ios, gateway),
        }
    }

    pub fn platform(&self, platform: PushPlatform) -> &PushDispatch {
        match platform {
            PushPlatform::Web => &self.web,
            PushPlatform::Android => &self.android,
            PushPlatform::Ios => &self.ios,
        }
    }
}
