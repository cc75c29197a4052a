//! Resend email provider.

use super::{EmailMessage, EmailProvider, EmailRequest};
use crate::error::{NotificationError, NotificationResult};
use crate::http::delivery_response;
use crate::templates::TemplateRenderer;
use async_trait::async_trait;
use core_config::{env_or_default, env_required, ConfigError, FromEnv};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

const PROVIDER: &str = "resend";

pub const DEFAULT_BASE_URL: &str = "https://api.resend.com";

#[derive(Clone)]
pub struct ResendSettings {
    pub api_key: String,
    pub from_email: String,
    pub from_name: String,
    pub base_url: String,
}

impl std::fmt::Debug for ResendSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendSettings")
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl FromEnv for ResendSettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env_required("RESEND_API_KEY")?,
            from_email: env_required("RESEND_FROM_EMAIL")?,
            from_name: env_or_default("RESEND_FROM_NAME", "Cedar"),
            base_url: env_or_default("RESEND_BASE_URL", DEFAULT_BASE_URL),
        })
    }
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: String,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<ResendAttachment<'a>>,
}

#[derive(Debug, Serialize)]
struct ResendAttachment<'a> {
    filename: &'a str,
    content: String,
}

pub struct ResendProvider {
    settings: ResendSettings,
    client: Client,
    renderer: Arc<TemplateRenderer>,
}

impl ResendProvider {
    pub fn new(
        settings: ResendSettings,
        renderer: Arc<TemplateRenderer>,
    ) -> NotificationResult<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(NotificationError::Configuration(
                "Resend API key is empty".to_string(),
            ));
        }

        Ok(Self {
            settings,
            client: Client::new(),
            renderer,
        })
    }

    async fn deliver(&self, email: &EmailMessage) -> NotificationResult<()> {
        let request = ResendRequest {
            from: format!("{} <{}>", self.settings.from_name, self.settings.from_email),
            to: &email.recipients,
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
            attachments: email
                .attachments
                .iter()
                .map(|attachment| ResendAttachment {
                    filename: &attachment.filename,
                    content: attachment.base64(),
                })
                .collect(),
        };

        debug!(to = ?email.recipients, "Sending email via Resend");

        let response = self
            .client
            .post(format!("{}/emails", self.settings.base_url))
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Error sending email via Resend");
                NotificationError::send(PROVIDER, e.to_string())
            })?;

        let body = delivery_response(PROVIDER, response).await?;
        debug!(id = ?body.get("id"), "Resend accepted email");
        Ok(())
    }
}

#[async_trait]
impl EmailProvider for ResendProvider {
    async fn send(&self, request: &EmailRequest<'_>) -> NotificationResult<()> {
        let email = EmailMessage::prepare(&self.renderer, request).await?;
        self.deliver(&email).await
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
