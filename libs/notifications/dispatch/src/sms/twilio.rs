//! Twilio programmable messaging.

use super::phone::{self, DEFAULT_COUNTRY_CODE};
use super::{SmsProvider, SmsReceipt};
use crate::error::{NotificationError, NotificationResult};
use crate::http::delivery_response;
use async_trait::async_trait;
use core_config::{env_or_default, env_required, ConfigError, FromEnv};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};

const PROVIDER: &str = "twilio";

pub const DEFAULT_BASE_URL: &str = "https://api.twilio.com/2010-04-01";

#[derive(Clone)]
pub struct TwilioSettings {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    /// Prepended to numbers given without one.
    pub country_code: String,
    pub base_url: String,
}

impl std::fmt::Debug for TwilioSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioSettings")
            .field("account_sid", &self.account_sid)
            .field("from_number", &self.from_number)
            .field("country_code", &self.country_code)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl FromEnv for TwilioSettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            account_sid: env_required("TWILIO_ACCOUNT_SID")?,
            auth_token: env_required("TWILIO_AUTH_TOKEN")?,
            from_number: env_required("TWILIO_PHONE_NUMBER")?,
            country_code: env_or_default("SMS_DEFAULT_COUNTRY_CODE", DEFAULT_COUNTRY_CODE),
            base_url: env_or_default("TWILIO_BASE_URL", DEFAULT_BASE_URL),
        })
    }
}

pub struct TwilioProvider {
    settings: TwilioSettings,
    client: Client,
}

impl TwilioProvider {
    pub fn new(settings: TwilioSettings) -> NotificationResult<Self> {
        let country_code = settings.country_code.trim_start_matches('+');
        if country_code.is_empty() || !country_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(NotificationError::Configuration(format!(
                "Invalid SMS country code: {}",
                settings.country_code
            )));
        }

        let settings = TwilioSettings {
            country_code: country_code.to_string(),
            ..settings
        };

        Ok(Self {
            settings,
            client: Client::new(),
        })
    }
}

#[async_trait]
impl SmsProvider for TwilioProvider {
    async fn send(&self, message: &str, phone_number: &str) -> NotificationResult<SmsReceipt> {
        let to = phone::to_e164(phone_number, &self.settings.country_code)?;
        let url = format!(
            "{}/Accounts/{}/Messages.json",
            self.settings.base_url, self.settings.account_sid
        );

        debug!(to = %phone::mask(&to), "Sending SMS via Twilio");

        let response = self
            .client
            .post(url)
            .basic_auth(&self.settings.account_sid, Some(&self.settings.auth_token))
            .form(&[
                ("To", to.as_str()),
                ("From", self.settings.from_number.as_str()),
                ("Body", message),
            ])
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Twilio API error");
                NotificationError::send(PROVIDER, e.to_string())
            })?;

        let payload = delivery_response(PROVIDER, response).await?;

        Ok(SmsReceipt {
            provider: PROVIDER,
            message_id: payload.get("sid").and_then(Value::as_str).map(str::to_string),
            payload,
        })
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
