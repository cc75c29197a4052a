//! KoraPay checkout. Amounts are sent in major units.

use super::{
    gateway_endpoint, pointer_str, GatewaySettings, PaymentProvider, PaymentRequest,
    PaymentSession, PaymentStatus,
};
use crate::error::{NotificationError, NotificationResult};
use crate::http::gateway_response;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error};

const PROVIDER: &str = "korapay";

pub const DEFAULT_BASE_URL: &str = "https://api.korapay.com/merchant/api/v1";

pub type KoraPaySettings = GatewaySettings;

pub struct KoraPayProvider {
    settings: KoraPaySettings,
    client: Client,
}

impl KoraPayProvider {
    pub fn new(settings: KoraPaySettings) -> NotificationResult<Self> {
        settings.validate("KoraPay")?;
        Ok(Self {
            settings,
            client: Client::new(),
        })
    }

    fn transport_error(e: reqwest::Error) -> NotificationError {
        error!(error = %e, "KoraPay API error");
        NotificationError::provider(PROVIDER, e.to_string(), None)
    }
}

#[async_trait]
impl PaymentProvider for KoraPayProvider {
    async fn initiate(&self, request: &PaymentRequest<'_>) -> NotificationResult<PaymentSession> {
        let body = json!({
            "amount": request.amount,
            "currency": request.currency,
            "reference": request.reference,
            "customer": {
                "name": request.customer_name(),
                "email": request.email,
            },
            "metadata": request.metadata,
        });

        debug!(reference = %request.reference, "Initializing KoraPay charge");

        let response = self
            .client
            .post(format!("{}/charges/initialize", self.settings.base_url))
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
            checkout_url: pointer_str(&payload, "/data/checkout_url"),
            payload,
        })
    }

    async fn verify(&self, reference: &str) -> NotificationResult<PaymentStatus> {
        let response = self
            .client
            .get(gateway_endpoint(
                PROVIDER,
                &self.settings.base_url,
                &["charges", reference],
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
