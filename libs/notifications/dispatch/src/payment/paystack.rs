//! Paystack transactions. Amounts are sent in minor units.

use super::{
    gateway_endpoint, pointer_str, to_minor_units, GatewaySettings, PaymentProvider,
    PaymentRequest, PaymentSession, PaymentStatus,
};
use crate::error::{NotificationError, NotificationResult};
use crate::http::gateway_response;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error};

const PROVIDER: &str = "paystack";

pub const DEFAULT_BASE_URL: &str = "https://api.paystack.co";

pub type PaystackSettings = GatewaySettings;

pub struct PaystackProvider {
    settings: PaystackSettings,
    client: Client,
}

impl PaystackProvider {
    pub fn new(settings: PaystackSettings) -> NotificationResult<Self> {
        settings.validate("Paystack")?;
        Ok(Self {
            settings,
            client: Client::new(),
        })
    }

    fn transport_error(e: reqwest::Error) -> NotificationError {
        error!(error = %e, "Paystack API error");
        NotificationError::provider(PROVIDER, e.to_string(), None)
    }
}

#[async_trait]
impl PaymentProvider for PaystackProvider {
    async fn initiate(&self, request: &PaymentRequest<'_>) -> NotificationResult<PaymentSession> {
        let body = json!({
            "amount": to_minor_units(request.amount),
            "currency": request.currency,
            "email": request.email,
            "reference": request.reference,
            "metadata": request.metadata,
        });

        debug!(reference = %request.reference, "Initializing Paystack transaction");

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.settings.base_url))
            .bearer_auth(&self.settings.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let payload = gateway_response(PROVIDER, response).await?;

        Ok(PaymentSession {
            provider: PROVIDER,
            reference: pointer_str(&payload, "/data/reference")
                .unwrap_or_else(|| request.reference.to_string()),
            checkout_url: pointer_str(&payload, "/data/authorization_url"),
            payload,
        })
    }

    async fn verify(&self, reference: &str) -> NotificationResult<PaymentStatus> {
        let response = self
            .client
            .get(gateway_endpoint(
                PROVIDER,
                &self.settings.base_url,
                &["transaction", "verify", reference],
            )?)
            .bearer_auth(&self.settings.secret_key)
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
