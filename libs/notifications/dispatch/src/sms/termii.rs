//! Termii SMS gateway.

use super::phone;
use super::{SmsProvider, SmsReceipt};
use crate::error::{NotificationError, NotificationResult};
use crate::http::delivery_response;
use async_trait::async_trait;
use core_config::{env_or_default, env_required, ConfigError, FromEnv};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

const PROVIDER: &str = "termii";

pub const DEFAULT_BASE_URL: &str = "https://v3.api.termii.com";

#[derive(Clone)]
pub struct TermiiSettings {
    pub api_key: String,
    pub sender_id: String,
    pub base_url: String,
}

impl std::fmt::Debug for TermiiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TermiiSettings")
            .field("sender_id", &self.sender_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl FromEnv for TermiiSettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env_required("TERMII_API_KEY")?,
            sender_id: env_or_default("TERMII_SENDER_ID", "Cedar"),
            base_url: env_or_default("TERMII_BASE_URL", DEFAULT_BASE_URL),
        })
    }
}

#[derive(Debug, Serialize)]
struct TermiiRequest<'a> {
    to: &'a str,
    from: &'a str,
    sms: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    channel: &'static str,
    api_key: &'a str,
}

pub struct TermiiProvider {
    settings: TermiiSettings,
    client: Client,
}

impl TermiiProvider {
    pub fn new(settings: TermiiSettings) -> NotificationResult<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(NotificationError::Configuration(
                "Termii API key is empty".to_string(),
            ));
        }

        Ok(Self {
            settings,
            client: Client::new(),
        })
    }
}

#[async_trait]
impl SmsProvider for TermiiProvider {
    async fn send(&self, message: &str, phone_number: &str) -> NotificationResult<SmsReceipt> {
        let to = phone::without_plus(phone_number)?;
        let request = TermiiRequest {
            to: &to,
            from: &self.settings.sender_id,
            sms: message,
            kind: "plain",
            channel: "generic",
            api_key: &self.settings.api_key,
        };

        debug!(to = %phone::mask(&to), "Sending SMS via Termii");

        let response = self
            .client
            .post(format!("{}/api/sms/send", self.settings.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Termii API error");
                NotificationError::send(PROVIDER, e.to_string())
            })?;

        let payload = delivery_response(PROVIDER, response).await?;

        Ok(SmsReceipt {
            provider: PROVIDER,
            message_id: payload
                .get("message_id")
                .and_then(Value::as_str)
                .map(str::to_string),
            payload,
        })
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
