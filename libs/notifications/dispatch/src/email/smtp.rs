//! SMTP email provider using lettre

use super::{EmailMessage, EmailProvider, EmailRequest};
use crate::error::{NotificationError, NotificationResult};
use crate::templates::TemplateRenderer;
use async_trait::async_trait;
use core_config::{env_or_default, env_parse_or, env_required, ConfigError, FromEnv};
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use tracing::{debug, error};

const PROVIDER: &str = "smtp";

/// Port on which the server expects TLS from the first byte.
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// SMTP provider configuration
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_name: String,
    /// Upgrade plain connections with STARTTLS. Ignored on the implicit TLS port.
    pub use_tls: bool,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("from_name", &self.from_name)
            .field("use_tls", &self.use_tls)
            .finish_non_exhaustive()
    }
}

impl FromEnv for SmtpSettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_required("SMTP_HOST")?,
            port: env_parse_or("SMTP_PORT", IMPLICIT_TLS_PORT)?,
            user: env_required("SMTP_USER")?,
            password: env_required("SMTP_PASSWORD")?,
            from_name: env_or_default("SMTP_FROM_NAME", "Cedar"),
            use_tls: env_parse_or("SMTP_USE_TLS", true)?,
        })
    }
}

/// SMTP email provider
pub struct SmtpProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    reply_to: Mailbox,
    renderer: Arc<TemplateRenderer>,
}

impl SmtpProvider {
    pub fn new(
        settings: SmtpSettings,
        renderer: Arc<TemplateRenderer>,
    ) -> NotificationResult<Self> {
        let credentials = Credentials::new(settings.user.clone(), settings.password.clone());

        let builder = if settings.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else if settings.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        } else {
            // Plain connection, e.g. Mailpit in local development
            Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(
                &settings.host,
            ))
        };

        let transport = builder
            .map_err(|e| {
                NotificationError::Configuration(format!(
                    "Invalid SMTP host {}: {e}",
                    settings.host
                ))
            })?
            .credentials(credentials)
            .port(settings.port)
            .build();

        let address: lettre::Address = settings.user.parse().map_err(|e| {
            NotificationError::Configuration(format!("Invalid SMTP_USER address: {e}"))
        })?;

        Ok(Self {
            transport,
            from: Mailbox::new(Some(settings.from_name), address.clone()),
            reply_to: Mailbox::new(None, address),
            renderer,
        })
    }

    fn build_message(&self, email: &EmailMessage) -> NotificationResult<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .reply_to(self.reply_to.clone())
            .subject(&email.subject);

        for recipient in &email.recipients {
            let mailbox: Mailbox = recipient.parse().map_err(|e| {
                NotificationError::send(PROVIDER, format!("Invalid recipient {recipient}: {e}"))
            })?;
            builder = builder.to(mailbox);
        }

        let mut body = MultiPart::mixed().multipart(MultiPart::alternative_plain_html(
            email.text.clone(),
            email.html.clone(),
        ));

        for attachment in &email.attachments {
            let content_type = ContentType::parse(attachment.mime_type())
                .map_err(|e| NotificationError::send(PROVIDER, e.to_string()))?;
            body = body.singlepart(
                Attachment::new(attachment.filename.clone())
                    .body(attachment.content.clone(), content_type),
            );
        }

        builder
            .multipart(body)
            .map_err(|e| NotificationError::send(PROVIDER, e.to_string()))
    }

    async fn deliver(&self, email: &EmailMessage) -> NotificationResult<()> {
        let message = self.build_message(email)?;

        debug!(to = ?email.recipients, "Sending email via SMTP");

        self.transport.send(message).await.map_err(|e| {
            error!(error = %e, "Error sending email via SMTP");
            NotificationError::send(PROVIDER, e.to_string())
        })?;

        Ok(())
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
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

    fn settings(port: u16) -> SmtpSettings {
        SmtpSettings {
            host: "localhost".to_string(),
            port,
            user: "noreply@cedar.io".to_string(),
            password: "secret".to_string(),
            from_name: "Cedar".to_string(),
            use_tls: false,
        }
    }

    fn renderer() -> Arc<TemplateRenderer> {
        Arc::new(TemplateRenderer::new().unwrap())
    }

    fn message() -> EmailMessage {
        EmailMessage {
            subject: "Monthly report".to_string(),
            recipients: vec!["a@cedar.io".to_string(), "b@cedar.io".to_string()],
            html: "<p>Hello</p>".to_string(),
            text: "Hello".to_string(),
            context: json!({}),
            attachments: vec![LoadedAttachment {
                filename: "report.pdf".to_string(),
                content: b"%PDF".to_vec(),
            }],
        }
    }

    #[test]
    fn test_settings_from_env_defaults_to_implicit_tls() {
        temp_env::with_vars(
            [
                ("SMTP_HOST", Some("smtp.cedar.io")),
                ("SMTP_PORT", None),
                ("SMTP_USER", Some("noreply@cedar.io")),
                ("SMTP_PASSWORD", Some("secret")),
                ("SMTP_FROM_NAME", None),
                ("SMTP_USE_TLS", None),
            ],
            || {
                let settings = SmtpSettings::from_env().unwrap();
                assert_eq!(settings.port, IMPLICIT_TLS_PORT);
                assert_eq!(settings.from_name, "Cedar");
                assert!(settings.use_tls);
            },
        );
    }

    #[test]
    fn test_settings_require_host() {
        temp_env::with_var_unset("SMTP_HOST", || {
            let err = SmtpSettings::from_env().unwrap_err();
            assert!(err.to_string().contains("SMTP_HOST"));
        });
    }

    #[test]
    fn test_debug_hides_password() {
        let rendered = format!("{:?}", settings(2525));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_invalid_sender_fails_at_construction() {
        let mut settings = settings(2525);
        settings.user = "not an address".to_string();
        let err = SmtpProvider::new(settings, renderer()).err().unwrap();
        assert!(matches!(err, NotificationError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_build_message_includes_all_parts() {
        let provider = SmtpProvider::new(settings(2525), renderer()).unwrap();
        let formatted = provider.build_message(&message()).unwrap().formatted();
        let raw = String::from_utf8_lossy(&formatted);

        assert!(raw.contains("Subject: Monthly report"));
        assert!(raw.contains("Reply-To: noreply@cedar.io"));
        assert!(raw.contains("a@cedar.io"));
        assert!(raw.contains("b@cedar.io"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("text/html"));
        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("report.pdf"));
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_send_error() {
        let provider = SmtpProvider::new(settings(2525), renderer()).unwrap();
        let mut email = message();
        email.recipients = vec!["nobody".to_string()];

        let err = provider.build_message(&email).unwrap_err();
        assert!(matches!(err, NotificationError::ProviderSend { provider: "smtp", .. }));
    }
}
