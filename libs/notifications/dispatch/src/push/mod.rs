//! Push channel: platform-specific payloads delivered through FCM.

pub mod fcm;
pub mod payload;

pub use fcm::{FcmClient, FcmSettings};

use crate::error::{NotificationError, NotificationResult};
use async_trait::async_trait;
use core_config::env_optional;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{info, instrument};

/// String key/value pairs delivered alongside the notification.
pub type PushData = BTreeMap<String, String>;

/// Device platform a notification is shaped for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PushPlatform {
    Web,
    Android,
    Ios,
}

impl PushPlatform {
    pub fn parse(value: &str) -> NotificationResult<Self> {
        value
            .trim()
            .parse()
            .map_err(|_| NotificationError::UnsupportedProviderType {
                channel: "push",
                value: value.to_string(),
            })
    }
}

/// Transport that accepts a complete message object.
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Returns the gateway's identifier for the accepted message.
    async fn deliver(&self, message: Value) -> NotificationResult<String>;

    fn name(&self) -> &'static str;
}

/// Push facade bound to one platform.
#[derive(Clone)]
pub struct PushDispatch {
    platform: PushPlatform,
    gateway: Arc<dyn PushGateway>,
    icon: Option<String>,
}

impl std::fmt::Debug for PushDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushDispatch")
            .field("platform", &self.platform)
            .field("gateway", &self.gateway.name())
            .field("icon", &self.icon)
            .finish()
    }
}

impl PushDispatch {
    pub fn new(platform: PushPlatform, gateway: Arc<dyn PushGateway>, icon: Option<String>) -> Self {
        Self {
            platform,
            gateway,
            icon,
        }
    }

    /// Bind `platform` to a shared gateway, taking the icon from `LOGO_ICON_PATH`.
    pub fn from_env(platform: PushPlatform, gateway: Arc<dyn PushGateway>) -> Self {
        Self::new(platform, gateway, env_optional("LOGO_ICON_PATH"))
    }

    pub fn platform(&self) -> PushPlatform {
        self.platform
    }

    /// Send one notification, waiting for the gateway to accept or reject it.
    #[instrument(skip_all, fields(platform = %self.platform))]
    pub async fn send(
        &self,
        title: &str,
        body: &str,
        registration_token: &str,
        data: Option<&PushData>,
    ) -> NotificationResult<()> {
        let empty = PushData::new();
        let message = payload::build(
            self.platform,
            title,
            body,
            registration_token,
            data.unwrap_or(&empty),
            self.icon.as_deref(),
        );

        let name = self.gateway.deliver(message).await?;
        info!(message = %name, "Successfully sent {} push message", self.platform);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingGateway {
        messages: Mutex<Vec<Value>>,
        fail: bool,
    }

    #[async_trait]
    impl PushGateway for RecordingGateway {
        async fn deliver(&self, message: Value) -> NotificationResult<String> {
            if self.fail {
                return Err(NotificationError::send("recording", "unregistered token"));
            }
            self.messages.lock().unwrap().push(message);
            Ok("projects/p/messages/1".to_string())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!(PushPlatform::parse("iOS").unwrap(), PushPlatform::Ios);
        assert_eq!(PushPlatform::parse("android").unwrap(), PushPlatform::Android);
        assert_eq!(PushPlatform::Web.to_string(), "web");
    }

    #[test]
    fn test_unknown_platform_is_unsupported() {
        let err = PushPlatform::parse("carrier-pigeon").unwrap_err();
        assert!(matches!(
            err,
            NotificationError::UnsupportedProviderType { channel: "push", .. }
        ));
    }

    #[tokio::test]
    async fn test_send_builds_platform_payload() {
        let gateway = Arc::new(RecordingGateway::default());
        let dispatch = PushDispatch::new(PushPlatform::Android, gateway.clone(), Some("/icon.png".into()));

        dispatch.send("Order", "Your order shipped", "device-1", None).await.unwrap();

        let messages = gateway.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["token"], "device-1");
        assert_eq!(messages[0]["android"]["notification"]["icon"], "/icon.png");
        assert_eq!(messages[0]["data"]["summary"], "Your order shipped");
    }

    #[tokio::test]
    async fn test_gateway_failure_propagates() {
        let gateway = Arc::new(RecordingGateway {
            fail: true,
            ..Default::default()
        });
        let dispatch = PushDispatch::new(PushPlatform::Web, gateway, None);

        let err = dispatch.send("t", "b", "stale", None).await.unwrap_err();
        assert!(matches!(err, NotificationError::ProviderSend { .. }));
    }

    #[test]
    fn test_from_env_reads_icon() {
        temp_env::with_var("LOGO_ICON_PATH", Some("https://cdn.cedar.io/logo.png"), || {
            let dispatch = PushDispatch::from_env(PushPlatform::Ios, Arc::new(RecordingGateway::default()));
            assert_eq!(dispatch.icon.as_deref(), Some("https://cdn.cedar.io/logo.png"));
            assert_eq!(dispatch.platform(), PushPlatform::Ios);
        });
    }
}
