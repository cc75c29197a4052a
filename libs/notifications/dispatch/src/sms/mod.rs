//! SMS channel.

pub mod dummy;
pub mod phone;
pub mod termii;
pub mod twilio;

pub use dummy::DummySmsProvider;
pub use termii::{TermiiProvider, TermiiSettings};
pub use twilio::{TwilioProvider, TwilioSettings};

use crate::error::{NotificationError, NotificationResult};
use async_trait::async_trait;
use core_config::{env_or_default, FromEnv};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{info, instrument};

/// What a provider returned for an accepted message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmsReceipt {
    pub provider: &'static str,
    pub message_id: Option<String>,
    /// Untouched provider response.
    pub payload: Value,
}

#[async_trait]
pub trait SmsProvider: Send + Sync {
    /// Normalize `phone_number` for this provider and send `message` once.
    async fn send(&self, message: &str, phone_number: &str) -> NotificationResult<SmsReceipt>;

    fn name(&self) -> &'static str;
}

/// Value of `SMS_SERVICE_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SmsProviderKind {
    Twilio,
    Termii,
    Dummy,
}

impl SmsProviderKind {
    pub fn parse(value: &str) -> NotificationResult<Self> {
        value
            .trim()
            .parse()
            .map_err(|_| NotificationError::UnsupportedProviderType {
                channel: "sms",
                value: value.to_string(),
            })
    }

    pub fn from_env() -> NotificationResult<Self> {
        Self::parse(&env_or_default("SMS_SERVICE_TYPE", "dummy"))
    }
}

#[derive(Debug, Clone)]
pub enum SmsProviderConfig {
    Twilio(TwilioSettings),
    Termii(TermiiSettings),
    Dummy,
}

impl SmsProviderConfig {
    pub fn load(kind: SmsProviderKind) -> NotificationResult<Self> {
        Ok(match kind {
            SmsProviderKind::Twilio => Self::Twilio(TwilioSettings::from_env()?),
            SmsProviderKind::Termii => Self::Termii(TermiiSettings::from_env()?),
            SmsProviderKind::Dummy => Self::Dummy,
        })
    }

    pub fn from_env() -> NotificationResult<Self> {
        Self::load(SmsProviderKind::from_env()?)
    }

    fn into_provider(self) -> NotificationResult<Arc<dyn SmsProvider>> {
        Ok(match self {
            Self::Twilio(settings) => Arc::new(TwilioProvider::new(settings)?),
            Self::Termii(settings) => Arc::new(TermiiProvider::new(settings)?),
            Self::Dummy => Arc::new(DummySmsProvider),
        })
    }
}

/// SMS facade holding one resolved provider.
#[derive(Clone)]
pub struct SmsDispatch {
    provider: Arc<dyn SmsProvider>,
}

impl std::fmt::Debug for SmsDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsDispatch")
            .field("provider", &self.provider.name())
            .finish()
    }
}

impl SmsDispatch {
    pub fn new(config: SmsProviderConfig) -> NotificationResult<Self> {
        Ok(Self::with_provider(config.into_provider()?))
    }

    pub fn from_env() -> NotificationResult<Self> {
        Self::new(SmsProviderConfig::from_env()?)
    }

    pub fn with_provider(provider: Arc<dyn SmsProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    #[instrument(skip_all, fields(provider = self.provider.name()))]
    pub async fn send(&self, message: &str, phone_number: &str) -> NotificationResult<SmsReceipt> {
        let receipt = self.provider.send(message, phone_number).await?;
        info!(message_id = ?receipt.message_id, "SMS sent via {}", receipt.provider);
        Ok(receipt)
    }
}
