//! Error types for the notification dispatch subsystem.

use core_config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Errors that can occur while constructing or invoking a channel.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Credentials or settings for the selected provider are missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The provider discriminant does not name a known adapter.
    #[error("Unsupported {channel} provider type: {value}")]
    UnsupportedProviderType { channel: &'static str, value: String },

    #[error("Template {0} not found")]
    TemplateNotFound(String),

    #[error("Failed to render template: {0}")]
    Render(String),

    #[error("Failed to read attachment {}: {source}", path.display())]
    AttachmentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid phone number: {0}")]
    InvalidPhoneNumber(String),

    /// Delivery through an email, SMS or push provider failed.
    #[error("{provider} send failed: {message}")]
    ProviderSend {
        provider: &'static str,
        message: String,
    },

    /// A payment gateway rejected or failed a request.
    ///
    /// `payload` keeps the gateway's response body when one was returned.
    #[error("{provider} error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
        payload: Option<serde_json::Value>,
    },
}

impl NotificationError {
    pub fn send(provider: &'static str, message: impl Into<String>) -> Self {
        Self::ProviderSend {
            provider,
            message: message.into(),
        }
    }

    pub fn provider(
        provider: &'static str,
        message: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self::Provider {
            provider,
            message: message.into(),
            payload,
        }
    }
}

impl From<ConfigError> for NotificationError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<handlebars::RenderError> for NotificationError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Render(err.to_string())
    }
}
