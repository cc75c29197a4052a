//! Mono direct-debit payments. Amounts are sent in minor units.

use super::{
    gateway_endpoint, pointer_str, to_minor_units, GatewaySettings, PaymentProvider,
    PaymentRequest, PaymentSession, PaymentStatus,
};
use crate::error::{NotificationError, NotificationResult};
use crate::http::gateway_response;
use async_trait::async_trait;
use core_config::{env_optional, ConfigError, FromEnv};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error};

const PROVIDER: &str = "mono";

pub const DEFAULT_BASE_URL: &str = "https://api.withmono.com/v2";

#[derive(Debug, Clone)]
pub struct MonoSettings {
    pub gateway: GatewaySettings,
    /// Used when a request carries no `success_url`.
    pub redirect_url: Option<String>,
}

impl FromEnv for MonoSettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            gateway: GatewaySettings::load("MONO", DEFAULT_BASE_URL)?,
            redirect_url: env_optional("PURCHASE_SUCCESS_URL"),
        })
    }
}

pub struct MonoProvider {
    settings: MonoSettings,
    client: Client,
}

impl MonoProvider {
    pub fn new(settings: MonoSettings) -> NotificationResult<Self> {
        settings.gateway.validate("Mono")?;
        Ok(Self {
            settings,
            client: Client::new(),
        })
    }

    fn transport_error(e: reqwest::Error) -> NotificationError {
        error!(error = %e, "Mono API error");
        NotificationError::provider(PROVIDER, e.to_string(), None)
    }

    fn initiate_body(&self, request: &PaymentRequest<'_>) -> Value {
        let options = request.options;
        json!({
            "amount": to_minor_units(request.amount),
            "type": "onetime-debit",
            "method": "account",
            "description": options.description.as_deref().unwrap_or("Payment"),
            "reference": request.reference,
            "redirect_url": options
                .success_url
                .as_deref()
                .or(self.settings.redirect_url.as_deref()),
            "customer": {
                "email": request.email,
                "name": request.customer_name(),
                "phone": options.phone.as_deref().unwrap_or_default(),
                "address": options.address.as_deref().unwrap_or_default(),
                "identity": options.identity.clone().unwrap_or_default(),
            },
            "meta": request.metadata,
        })
    }
}

#[async_trait]
impl PaymentProvider for MonoProvider {
    async fn initiate(&self, request: &PaymentRequest<'_>) -> NotificationResult<PaymentSession> {
        debug!(reference = %request.reference, "Initiating Mono payment");

        let response = self
            .client
            .post(format!("{}/payments/initiate", self.settings.gateway.base_url))
            .bearer_auth(&self.settings.gateway.secret_key)
            .header("Accept", "application/json")
            .json(&self.initiate_body(request))
            .send()
            .await
            .map_err(Self::transport_error)?;

        let mut payload = gateway_response(PROVIDER, response).await?;
        let checkout_url = pointer_str(&payload, "/data/mono_url");

        // Expose the link under the same key the other gateways use
        if let (Some(url), Some(data)) = (&checkout_url, payload.get_mut("data")) {
            if let Some(data) = data.as_object_mut() {
                data.insert("checkout_url".to_string(), json!(url));
            }
        }

        Ok(PaymentSession {
            provider: PROVIDER,
            reference: pointer_str(&payload, "/data/reference")
                .unwrap_or_else(|| request.reference.to_string()),
            checkout_url,
            payload,
        })
    }

    async fn verify(&self, reference: &str) -> NotificationResult<PaymentStatus> {
        let response = self
            .client
            .get(gateway_endpoint(
                PROVIDER,
                &self.settings.gateway.base_url,
                &["payments", reference, "verify"],
            )?)
            .bearer_auth(&self.settings.gateway.secret_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(Self::transport_error)?;

        let payload = gateway_response(PROVIDER, response).await?;

        Ok(PaymentStatus {
            provider: PROVIDER,
            reference: reference.to_string(),
            status: pointer_str(&payload, "/data/status").unwrap_or_else(|| "unknown".to_string()),
            payload,
        })
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
