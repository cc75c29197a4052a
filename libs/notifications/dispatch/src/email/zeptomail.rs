//! ZeptoMail transactional email provider.

use super::{EmailMessage, EmailProvider, EmailRequest};
use crate::error::{NotificationError, NotificationResult};
use crate::http::delivery_response;
use crate::templates::TemplateRenderer;
use async_trait::async_trait;
use core_config::{env_or_default, env_required, ConfigError, FromEnv};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

const PROVIDER: &str = "zeptomail";

pub const DEFAULT_BASE_URL: &str = "https://api.zeptomail.com/v1.1";

#[derive(Clone)]
pub struct ZeptoMailSettings {
    pub api_key: String,
    pub from_address: String,
    pub from_name: String,
    pub base_url: String,
}

impl std::fmt::Debug for ZeptoMailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZeptoMailSettings")
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl FromEnv for ZeptoMailSettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: env_required("ZEPTOMAIL_API_KEY")?,
            from_address: env_required("ZEPTOMAIL_EMAIL_ADDRESS")?,
            from_name: env_or_default("ZEPTOMAIL_EMAIL_NAME", "Cedar"),
            base_url: env_or_default("ZEPTOMAIL_BASE_URL", DEFAULT_BASE_URL),
        })
    }
}

#[derive(Debug, Serialize)]
struct ZeptoMailRequest<'a> {
    from: Sender<'a>,
    to: Vec<Recipient<'a>>,
    subject: &'a str,
    htmlbody: &'a str,
    textbody: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<ZeptoMailAttachment<'a>>,
}

#[derive(Debug, Serialize)]
struct Sender<'a> {
    address: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    email_address: RecipientAddress<'a>,
}

#[derive(Debug, Serialize)]
struct RecipientAddress<'a> {
    address: &'a str,
}

#[derive(Debug, Serialize)]
struct ZeptoMailAttachment<'a> {
    name: &'a str,
    content: String,
    mime_type: &'static str,
}

pub struct ZeptoMailProvider {
    settings: ZeptoMailSettings,
    client: Client,
    renderer: Arc<TemplateRenderer>,
}

impl ZeptoMailProvider {
    pub fn new(
        settings: ZeptoMailSettings,
        renderer: Arc<TemplateRenderer>,
    ) -> NotificationResult<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(NotificationError::Configuration(
                "ZeptoMail API key is empty".to_string(),
            ));
        }

        Ok(Self {
            settings,
            client: Client::new(),
            renderer,
        })
    }

    fn build_request<'a>(&'a self, email: &'a EmailMessage) -> ZeptoMailRequest<'a> {
        ZeptoMailRequest {
            from: Sender {
                address: &self.settings.from_address,
                name: &self.settings.from_name,
            },
            to: email
                .recipients
                .iter()
                .map(|address| Recipient {
                    email_address: RecipientAddress { address },
                })
                .collect(),
            subject: &email.subject,
            htmlbody: &email.html,
            textbody: &email.text,
            attachments: email
                .attachments
                .iter()
                .map(|attachment| ZeptoMailAttachment {
                    name: &attachment.filename,
                    content: attachment.base64(),
                    mime_type: attachment.mime_type(),
                })
                .collect(),
        }
    }

    async fn deliver(&self, email: &EmailMessage) -> NotificationResult<()> {
        let request = self.build_request(email);
        debug!(to = ?email.recipients, "Sending email via ZeptoMail");

        let response = self
            .client
            .post(format!("{}/email", self.settings.base_url))
            .header("Authorization", format!("Zoho-enczapikey {}", self.settings.api_key))
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Error sending email via ZeptoMail");
                NotificationError::send(PROVIDER, e.to_string())
            })?;

        delivery_response(PROVIDER, response).await?;
        Ok(())
    }
}

#[async_trait]
impl EmailProvider for ZeptoMailProvider {
    async fn send(&self, request: &EmailRequest<'_>) -> NotificationResult<()> {
        let email = EmailMessage::prepare(&self.renderer, request).await?;
        self.deliver(&email).await
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::LoadedAttachment;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: String) -> ZeptoMailProvider {
        let settings = ZeptoMailSettings {
            api_key: "zk-test".to_string(),
            from_address: "noreply@cedar.io".to_string(),
            from_name: "Cedar".to_string(),
            base_url,
        };
        ZeptoMailProvider::new(settings, Arc::new(TemplateRenderer::new().unwrap())).unwrap()
    }

    fn message() -> EmailMessage {
        EmailMessage {
            subject: "Welcome".to_string(),
            recipients: vec!["jo@cedar.io".to_string()],
            html: "<p>Hi</p>".to_string(),
            text: "Hi".to_string(),
            context: json!({}),
            attachments: vec![LoadedAttachment {
                filename: "terms.pdf".to_string(),
                content: b"hello".to_vec(),
            }],
        }
    }

    #[tokio::test]
    async fn test_deliver_posts_expected_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/email"))
            .and(header("Authorization", "Zoho-enczapikey zk-test"))
            .and(body_partial_json(json!({
                "from": { "address": "noreply@cedar.io", "name": "Cedar" },
                "to": [{ "email_address": { "address": "jo@cedar.io" } }],
                "subject": "Welcome",
                "htmlbody": "<p>Hi</p>",
                "textbody": "Hi",
                "attachments": [{
                    "name": "terms.pdf",
                    "content": "aGVsbG8=",
                    "mime_type": "application/pdf"
                }]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "message": "OK" })))
            .expect(1)
            .mount(&server)
            .await;

        provider(server.uri()).deliver(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejection_is_send_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let err = provider(server.uri()).deliver(&message()).await.unwrap_err();
        match err {
            NotificationError::ProviderSend { provider, message } => {
                assert_eq!(provider, "zeptomail");
                assert!(message.contains("401"));
                assert!(message.contains("invalid token"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_settings_require_sender_address() {
        temp_env::with_vars(
            [
                ("ZEPTOMAIL_API_KEY", Some("zk")),
                ("ZEPTOMAIL_EMAIL_ADDRESS", None),
            ],
            || {
                let err = ZeptoMailSettings::from_env().unwrap_err();
                assert!(err.to_string().contains("ZEPTOMAIL_EMAIL_ADDRESS"));
            },
        );
    }
}
