use super::{EmailProvider, EmailRequest};
use crate::error::NotificationResult;
use async_trait::async_trait;
use tracing::info;

/// Logs the request instead of sending it. For local development and tests.
///
/// Nothing is rendered and no attachment is read, so a dummy send succeeds
/// even for templates or files that do not exist.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyEmailProvider;

#[async_trait]
impl EmailProvider for DummyEmailProvider {
    async fn send(&self, request: &EmailRequest<'_>) -> NotificationResult<()> {
        let context = serde_json::to_string_pretty(request.context).unwrap_or_default();
        info!(
            to = ?request.recipients,
            subject = %request.subject,
            template = %request.template,
            attachments = request.attachments.len(),
            "Dummy email service\n{context}"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dummy"
    }
}
