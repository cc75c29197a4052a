use super::{phone, SmsProvider, SmsReceipt};
use crate::error::NotificationResult;
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

/// Logs messages instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummySmsProvider;

#[async_trait]
impl SmsProvider for DummySmsProvider {
    async fn send(&self, message: &str, phone_number: &str) -> NotificationResult<SmsReceipt> {
        info!(to = %phone::mask(phone_number), "Sending dummy SMS: {message}");
        Ok(SmsReceipt {
            provider: "dummy",
            message_id: None,
            payload: json!({ "status": "success", "message": "Dummy SMS sent" }),
        })
    }

    fn name(&self) -> &'static str {
        "dummy"
    }
}
