//! Email channel: one facade over SMTP and HTTP transactional senders.
//!
//! The facade hands the raw [`EmailRequest`] to the configured adapter.
//! Adapters that actually deliver mail build their [`EmailMessage`] with
//! [`EmailMessage::prepare`]; the dummy sender only logs the request and
//! never renders or reads attachments.

pub mod dummy;
pub mod resend;
pub mod smtp;
pub mod zeptomail;

pub use dummy::DummyEmailProvider;
pub use resend::{ResendProvider, ResendSettings};
pub use smtp::{SmtpProvider, SmtpSettings};
pub use zeptomail::{ZeptoMailProvider, ZeptoMailSettings};

use crate::attachment::{self, Attachment, LoadedAttachment};
use crate::error::{NotificationError, NotificationResult};
use crate::templates::TemplateRenderer;
use async_trait::async_trait;
use core_config::{env_or_default, FromEnv};
use serde_json::Value;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{info, instrument};

/// What the caller asked to send, before any rendering.
#[derive(Debug, Clone, Copy)]
pub struct EmailRequest<'a> {
    pub subject: &'a str,
    pub template: &'a str,
    pub recipients: &'a [String],
    pub context: &'a Value,
    pub attachments: &'a [Attachment],
}

/// A rendered email ready for delivery.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub subject: String,
    pub recipients: Vec<String>,
    pub html: String,
    pub text: String,
    pub context: Value,
    pub attachments: Vec<LoadedAttachment>,
}

impl EmailMessage {
    /// Render the request's template and read its attachments.
    ///
    /// Fails before anything is sent if the template is unknown or any
    /// attachment cannot be read.
    pub async fn prepare(
        renderer: &TemplateRenderer,
        request: &EmailRequest<'_>,
    ) -> NotificationResult<Self> {
        let rendered = renderer.render(request.template, request.context)?;
        let attachments = attachment::load_all(request.attachments).await?;

        Ok(Self {
            subject: request.subject.to_string(),
            recipients: request.recipients.to_vec(),
            html: rendered.html,
            text: rendered.text,
            context: request.context.clone(),
            attachments,
        })
    }
}

/// Trait for email providers
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Send one request in a single delivery attempt.
    async fn send(&self, request: &EmailRequest<'_>) -> NotificationResult<()>;

    /// Get provider name
    fn name(&self) -> &'static str;
}

/// Value of `EMAIL_SERVICE_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EmailProviderKind {
    Smtp,
    ZeptoMail,
    Resend,
    Dummy,
}

impl EmailProviderKind {
    pub fn parse(value: &str) -> NotificationResult<Self> {
        value
            .trim()
            .parse()
            .map_err(|_| NotificationError::UnsupportedProviderType {
                channel: "email",
                value: value.to_string(),
            })
    }

    /// Read the discriminant, falling back to the dummy sender when unset.
    pub fn from_env() -> NotificationResult<Self> {
        Self::parse(&env_or_default("EMAIL_SERVICE_TYPE", "dummy"))
    }
}

/// Settings for exactly one email provider.
#[derive(Debug, Clone)]
pub enum EmailProviderConfig {
    Smtp(SmtpSettings),
    ZeptoMail(ZeptoMailSettings),
    Resend(ResendSettings),
    Dummy,
}

impl EmailProviderConfig {
    /// Load the settings the given provider needs.
    pub fn load(kind: EmailProviderKind) -> NotificationResult<Self> {
        Ok(match kind {
            EmailProviderKind::Smtp => Self::Smtp(SmtpSettings::from_env()?),
            EmailProviderKind::ZeptoMail => Self::ZeptoMail(ZeptoMailSettings::from_env()?),
            EmailProviderKind::Resend => Self::Resend(ResendSettings::from_env()?),
            EmailProviderKind::Dummy => Self::Dummy,
        })
    }

    pub fn from_env() -> NotificationResult<Self> {
        Self::load(EmailProviderKind::from_env()?)
    }

    fn into_provider(
        self,
        renderer: Arc<TemplateRenderer>,
    ) -> NotificationResult<Arc<dyn EmailProvider>> {
        Ok(match self {
            Self::Smtp(settings) => Arc::new(SmtpProvider::new(settings, renderer)?),
            Self::ZeptoMail(settings) => Arc::new(ZeptoMailProvider::new(settings, renderer)?),
            Self::Resend(settings) => Arc::new(ResendProvider::new(settings, renderer)?),
            Self::Dummy => Arc::new(DummyEmailProvider),
        })
    }
}

/// Email facade holding one resolved provider for its lifetime.
#[derive(Clone)]
pub struct EmailDispatch {
    provider: Arc<dyn EmailProvider>,
}

impl std::fmt::Debug for EmailDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailDispatch")
            .field("provider", &self.provider.name())
            .finish()
    }
}

impl EmailDispatch {
    pub fn new(
        config: EmailProviderConfig,
        renderer: Arc<TemplateRenderer>,
    ) -> NotificationResult<Self> {
        Ok(Self::with_provider(config.into_provider(renderer)?))
    }

    /// Build from `EMAIL_SERVICE_TYPE` and the selected provider's variables.
    pub fn from_env(renderer: Arc<TemplateRenderer>) -> NotificationResult<Self> {
        Self::new(EmailProviderConfig::from_env()?, renderer)
    }

    pub fn with_provider(provider: Arc<dyn EmailProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Send `template` to `recipients` through the configured provider.
    ///
    /// Rendering and attachment failures abort the send before any delivery
    /// attempt; the delivery itself is attempted exactly once.
    #[instrument(skip_all, fields(provider = self.provider.name(), template = %template))]
    pub async fn send(
        &self,
        subject: &str,
        template: &str,
        recipients: &[String],
        context: &Value,
        attachments: &[Attachment],
    ) -> NotificationResult<()> {
        let request = EmailRequest {
            subject,
            template,
            recipients,
            context,
            attachments,
        };

        self.provider.send(&request).await?;

        info!(to = ?recipients, "Email sent via {}", self.provider.name());
        Ok(())
    }
}
