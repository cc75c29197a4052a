//! Stripe Checkout sessions. Amounts are sent in minor units.
//!
//! Stripe takes form-encoded bodies with bracketed keys for nested fields,
//! and `verify` takes the checkout session id rather than the merchant
//! reference.

use super::{
    gateway_endpoint, pointer_str, to_minor_units, GatewaySettings, PaymentProvider,
    PaymentRequest, PaymentSession, PaymentStatus,
};
use crate::error::{NotificationError, NotificationResult};
use crate::http::gateway_response;
use async_trait::async_trait;
use core_config::{env_optional, ConfigError, FromEnv};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};

const PROVIDER: &str = "stripe";

pub const DEFAULT_BASE_URL: &str = "https://api.stripe.com";

#[derive(Debug, Clone)]
pub struct StripeSettings {
    pub gateway: GatewaySettings,
    /// Used when a request carries no `success_url`.
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

impl FromEnv for StripeSettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            gateway: GatewaySettings::load("STRIPE", DEFAULT_BASE_URL)?,
            success_url: env_optional("PURCHASE_SUCCESS_URL"),
            cancel_url: env_optional("PURCHASE_CANCEL_URL"),
        })
    }
}

pub struct StripeProvider {
    settings: StripeSettings,
    client: Client,
}

impl StripeProvider {
    pub fn new(settings: StripeSettings) -> NotificationResult<Self> {
        settings.gateway.validate("Stripe")?;
        Ok(Self {
            settings,
            client: Client::new(),
        })
    }

    fn transport_error(e: reqwest::Error) -> NotificationError {
        error!(error = %e, "Stripe API error");
        NotificationError::provider(PROVIDER, e.to_string(), None)
    }

    fn session_form(&self, request: &PaymentRequest<'_>) -> Vec<(String, String)> {
        let mut form: Vec<(String, String)> = vec![
            ("payment_method_types[0]".into(), "card".into()),
            ("client_reference_id".into(), request.reference.into()),
            ("line_items[0][price_data][currency]".into(), request.currency.to_lowercase()),
            ("line_items[0][price_data][product_data][name]".into(), "Payment".into()),
            (
                "line_items[0][price_data][unit_amount]".into(),
                to_minor_units(request.amount).to_string(),
            ),
            ("line_items[0][quantity]".into(), "1".into()),
            ("mode".into(), "payment".into()),
            ("customer_email".into(), request.email.into()),
        ];

        if let Some(metadata) = request.metadata.as_object() {
            for (key, value) in metadata {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                form.push((format!("metadata[{key}]"), value));
            }
        }

        let success_url = request
            .options
            .success_url
            .as_ref()
            .or(self.settings.success_url.as_ref());
        if let Some(url) = success_url {
            form.push(("success_url".into(), url.clone()));
        }

        let cancel_url = request
            .options
            .cancel_url
            .as_ref()
            .or(self.settings.cancel_url.as_ref());
        if let Some(url) = cancel_url {
            form.push(("cancel_url".into(), url.clone()));
        }

        form
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn initiate(&self, request: &PaymentRequest<'_>) -> NotificationResult<PaymentSession> {
        debug!(reference = %request.reference, "Creating Stripe checkout session");

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.settings.gateway.base_url))
            .bearer_auth(&self.settings.gateway.secret_key)
            .form(&self.session_form(request))
            .send()
            .await
            .map_err(Self::transport_error)?;

        let payload = gateway_response(PROVIDER, response).await?;
        let session_id = pointer_str(&payload, "/id").ok_or_else(|| {
            NotificationError::provider(PROVIDER, "Checkout session has no id", Some(payload.clone()))
        })?;

        Ok(PaymentSession {
            provider: PROVIDER,
            reference: session_id,
            checkout_url: pointer_str(&payload, "/url"),
            payload,
        })
    }

    async fn verify(&self, session_id: &str) -> NotificationResult<PaymentStatus> {
        let response = self
            .client
            .get(gateway_endpoint(
                PROVIDER,
                &self.settings.gateway.base_url,
                &["v1", "checkout", "sessions", session_id],
            )?)
            .bearer_auth(&self.settings.gateway.secret_key)
            .send()
            .await
            .map_err(Self::transport_error)?;

        let payload = gateway_response(PROVIDER, response).await?;

        Ok(PaymentStatus {
            provider: PROVIDER,
            reference: session_id.to_string(),
            status: pointer_str(&payload, "/payment_status")
                .unwrap_or_else(|| "unknown".to_string()),
            payload,
        })
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::{PaymentDispatch, PaymentOptions};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base_url: String) -> StripeSettings {
        StripeSettings {
            gateway: GatewaySettings {
                secret_key: "sk_test_stripe".to_string(),
                base_url,
            },
            success_url: Some("https://cedar.io/paid".to_string()),
            cancel_url: Some("https://cedar.io/cancelled".to_string()),
        }
    }

    fn form_value<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_session_form() {
        let provider = StripeProvider::new(settings(DEFAULT_BASE_URL.to_string())).unwrap();
        let metadata = json!({ "order": "ord-4", "seats": 2 });
        let options = PaymentOptions {
            cancel_url: Some("https://shop/back".to_string()),
            ..Default::default()
        };
        let request = PaymentRequest {
            amount: 50.0,
            currency: "USD",
            email: "jo@cedar.io",
            reference: "ord-4",
            metadata: &metadata,
            options: &options,
        };

        let form = provider.session_form(&request);
        assert_eq!(form_value(&form, "line_items[0][price_data][unit_amount]"), Some("5000"));
        assert_eq!(form_value(&form, "line_items[0][price_data][currency]"), Some("usd"));
        assert_eq!(form_value(&form, "client_reference_id"), Some("ord-4"));
        assert_eq!(form_value(&form, "metadata[order]"), Some("ord-4"));
        assert_eq!(form_value(&form, "metadata[seats]"), Some("2"));
        assert_eq!(form_value(&form, "success_url"), Some("https://cedar.io/paid"));
        assert_eq!(form_value(&form, "cancel_url"), Some("https://shop/back"));
    }

    #[tokio::test]
    async fn test_initiate_returns_session_id_and_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/checkout/sessions"))
            .and(header("Authorization", "Bearer sk_test_stripe"))
            .and(body_string_contains("mode=payment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_1",
                "url": "https://checkout.stripe.com/c/pay/cs_test_1",
                "payment_status": "unpaid"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dispatch = PaymentDispatch::with_provider(Arc::new(
            StripeProvider::new(settings(server.uri())).unwrap(),
        ));
        let session = dispatch
            .initiate_payment(50.0, "USD", "jo@cedar.io", "ord-4", None, None)
            .await
            .unwrap();

        assert_eq!(session.reference, "cs_test_1");
        assert_eq!(
            session.checkout_url.as_deref(),
            Some("https://checkout.stripe.com/c/pay/cs_test_1")
        );
    }

    #[tokio::test]
    async fn test_verify_reads_payment_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/checkout/sessions/cs_test_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_1",
                "payment_status": "paid"
            })))
            .mount(&server)
            .await;

        let provider = StripeProvider::new(settings(server.uri())).unwrap();
        let status = provider.verify("cs_test_1").await.unwrap();
        assert_eq!(status.status, "paid");
    }

    #[tokio::test]
    async fn test_stripe_error_message_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "type": "invalid_request_error", "message": "No such checkout.session: cs_x" }
            })))
            .mount(&server)
            .await;

        let provider = StripeProvider::new(settings(server.uri())).unwrap();
        let err = provider.verify("cs_x").await.unwrap_err();
        assert_eq!(err.to_string(), "stripe error: No such checkout.session: cs_x");
    }

    #[tokio::test]
    async fn test_verify_session_id_stays_in_sessions_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/balance"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/checkout/sessions/..%2F..%2Fbalance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "payment_status": "unpaid"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = StripeProvider::new(settings(server.uri())).unwrap();
        let status = provider.verify("../../balance").await.unwrap();
        assert_eq!(status.status, "unpaid");

        assert!(provider.verify("..").await.is_err());
    }
}
