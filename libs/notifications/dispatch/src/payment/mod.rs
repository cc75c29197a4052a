//! Payment channel: checkout initiation and read-only verification.
//!
//! Callers always pass amounts in major currency units; each adapter
//! converts to whatever unit its gateway expects.

pub mod korapay;
pub mod mono;
pub mod paystack;
pub mod stripe;

pub use korapay::KoraPayProvider;
pub use mono::{MonoProvider, MonoSettings};
pub use paystack::PaystackProvider;
pub use stripe::{StripeProvider, StripeSettings};

use crate::error::{NotificationError, NotificationResult};
use async_trait::async_trait;
use core_config::{env_optional, env_required, ConfigError, Environment, FromEnv};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{info, instrument};

/// Customer and redirect details some gateways use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentOptions {
    pub customer_name: Option<String>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub identity: Option<PaymentIdentity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentIdentity {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

/// One checkout attempt.
#[derive(Debug, Clone)]
pub struct PaymentRequest<'a> {
    /// Major currency units.
    pub amount: f64,
    pub currency: &'a str,
    pub email: &'a str,
    /// Must be unique per attempt; adapters do not deduplicate.
    pub reference: &'a str,
    pub metadata: &'a Value,
    pub options: &'a PaymentOptions,
}

impl PaymentRequest<'_> {
    pub fn customer_name(&self) -> &str {
        self.options.customer_name.as_deref().unwrap_or("Anonymous")
    }
}

/// A created checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentSession {
    pub provider: &'static str,
    /// Identifier to pass to `verify_payment`.
    pub reference: String,
    pub checkout_url: Option<String>,
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentStatus {
    pub provider: &'static str,
    pub reference: String,
    /// Gateway status string, e.g. `success` or `paid`.
    pub status: String,
    pub payload: Value,
}

/// Convert major units to minor units (×100), rounding to the nearest unit.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Read a string at a JSON pointer, e.g. `/data/status`.
pub(crate) fn pointer_str(payload: &Value, pointer: &str) -> Option<String> {
    payload
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Gateway endpoint for `base_url` followed by `segments`.
///
/// Each segment is percent-encoded as a single path segment, so a caller
/// supplied reference can never climb out of the endpoint it was meant for.
pub(crate) fn gateway_endpoint(
    provider: &'static str,
    base_url: &str,
    segments: &[&str],
) -> NotificationResult<reqwest::Url> {
    if let Some(bad) = segments
        .iter()
        .find(|s| s.is_empty() || matches!(**s, "." | ".."))
    {
        return Err(NotificationError::provider(
            provider,
            format!("Invalid path segment {bad:?}"),
            None,
        ));
    }

    let mut url = reqwest::Url::parse(base_url).map_err(|e| {
        NotificationError::provider(provider, format!("Invalid base url: {e}"), None)
    })?;
    url.path_segments_mut()
        .map_err(|_| {
            NotificationError::provider(provider, "Base url cannot carry a path", None)
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn initiate(&self, request: &PaymentRequest<'_>) -> NotificationResult<PaymentSession>;

    /// Read-only status lookup; safe to repeat.
    async fn verify(&self, reference: &str) -> NotificationResult<PaymentStatus>;

    fn name(&self) -> &'static str;
}

/// Secret key and endpoint for one gateway.
#[derive(Clone)]
pub struct GatewaySettings {
    pub secret_key: String,
    pub base_url: String,
}

impl std::fmt::Debug for GatewaySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewaySettings")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GatewaySettings {
    /// Reads `<PREFIX>_SECRET_KEY` in production and `DEV_<PREFIX>_SECRET_KEY`
    /// otherwise; `<PREFIX>_BASE_URL` overrides the endpoint.
    pub fn load(prefix: &str, default_base_url: &str) -> Result<Self, ConfigError> {
        let key_var = if Environment::from_env().is_production() {
            format!("{prefix}_SECRET_KEY")
        } else {
            format!("DEV_{prefix}_SECRET_KEY")
        };

        Ok(Self {
            secret_key: env_required(&key_var)?,
            base_url: env_optional(&format!("{prefix}_BASE_URL"))
                .unwrap_or_else(|| default_base_url.to_string()),
        })
    }

    pub(crate) fn validate(&self, provider: &str) -> NotificationResult<()> {
        if self.secret_key.trim().is_empty() {
            return Err(NotificationError::Configuration(format!(
                "{provider} secret key is empty"
            )));
        }
        Ok(())
    }
}

/// Value of `PAYMENT_SERVICE_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PaymentProviderKind {
    KoraPay,
    Paystack,
    Stripe,
    Mono,
}

impl PaymentProviderKind {
    pub fn parse(value: &str) -> NotificationResult<Self> {
        value
            .trim()
            .parse()
            .map_err(|_| NotificationError::UnsupportedProviderType {
                channel: "payment",
                value: value.to_string(),
            })
    }

    /// `None` when `PAYMENT_SERVICE_TYPE` is unset.
    pub fn from_env() -> NotificationResult<Option<Self>> {
        env_optional("PAYMENT_SERVICE_TYPE")
            .map(|value| Self::parse(&value))
            .transpose()
    }
}

#[derive(Debug, Clone)]
pub enum PaymentProviderConfig {
    KoraPay(GatewaySettings),
    Paystack(GatewaySettings),
    Stripe(StripeSettings),
    Mono(MonoSettings),
}

impl PaymentProviderConfig {
    pub fn load(kind: PaymentProviderKind) -> NotificationResult<Self> {
        Ok(match kind {
            PaymentProviderKind::KoraPay => {
                Self::KoraPay(GatewaySettings::load("KORAPAY", korapay::DEFAULT_BASE_URL)?)
            }
            PaymentProviderKind::Paystack => {
                Self::Paystack(GatewaySettings::load("PAYSTACK", paystack::DEFAULT_BASE_URL)?)
            }
            PaymentProviderKind::Stripe => Self::Stripe(StripeSettings::from_env()?),
            PaymentProviderKind::Mono => Self::Mono(MonoSettings::from_env()?),
        })
    }

    fn into_provider(self) -> NotificationResult<Arc<dyn PaymentProvider>> {
        Ok(match self {
            Self::KoraPay(settings) => Arc::new(KoraPayProvider::new(settings)?),
            Self::Paystack(settings) => Arc::new(PaystackProvider::new(settings)?),
            Self::Stripe(settings) => Arc::new(StripeProvider::new(settings)?),
            Self::Mono(settings) => Arc::new(MonoProvider::new(settings)?),
        })
    }
}

/// Payment facade holding one resolved gateway.
#[derive(Clone)]
pub struct PaymentDispatch {
    provider: Arc<dyn PaymentProvider>,
}

impl std::fmt::Debug for PaymentDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentDispatch")
            .field("provider", &self.provider.name())
            .finish()
    }
}

impl PaymentDispatch {
    pub fn new(config: PaymentProviderConfig) -> NotificationResult<Self> {
        Ok(Self::with_provider(config.into_provider()?))
    }

    /// Build from `PAYMENT_SERVICE_TYPE`; `None` when no gateway is selected.
    pub fn from_env() -> NotificationResult<Option<Self>> {
        PaymentProviderKind::from_env()?
            .map(|kind| Self::new(PaymentProviderConfig::load(kind)?))
            .transpose()
    }

    pub fn with_provider(provider: Arc<dyn PaymentProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    #[instrument(skip_all, fields(provider = self.provider.name(), reference = %reference))]
    pub async fn initiate_payment(
        &self,
        amount: f64,
        currency: &str,
        email: &str,
        reference: &str,
        metadata: Option<&Value>,
        options: Option<&PaymentOptions>,
    ) -> NotificationResult<PaymentSession> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(NotificationError::provider(
                self.provider.name(),
                format!("Invalid amount {amount}"),
                None,
            ));
        }

        let empty_metadata = Value::Object(Default::default());
        let default_options = PaymentOptions::default();
        let request = PaymentRequest {
            amount,
            currency,
            email,
            reference,
            metadata: metadata.unwrap_or(&empty_metadata),
            options: options.unwrap_or(&default_options),
        };

        let session = self.provider.initiate(&request).await?;
        info!(reference = %session.reference, "Payment initiated");
        Ok(session)
    }

    #[instrument(skip_all, fields(provider = self.provider.name(), reference = %reference))]
    pub async fn verify_payment(&self, reference: &str) -> NotificationResult<PaymentStatus> {
        self.provider.verify(reference).await
    }
}
