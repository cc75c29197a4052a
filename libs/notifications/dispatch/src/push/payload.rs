//! FCM HTTP v1 message bodies per device platform.

use super::{PushData, PushPlatform};
use serde_json::{json, Value};

pub const ANDROID_COLOR: &str = "#f45342";

/// Copy of `data` whose `summary` falls back to the notification body.
pub fn with_summary(data: &PushData, body: &str) -> PushData {
    let mut data = data.clone();
    let missing = data.get("summary").is_none_or(|summary| summary.is_empty());
    if missing {
        data.insert("summary".to_string(), body.to_string());
    }
    data
}

/// The `message` object for one device.
pub fn build(
    platform: PushPlatform,
    title: &str,
    body: &str,
    token: &str,
    data: &PushData,
    icon: Option<&str>,
) -> Value {
    let data = with_summary(data, body);

    match platform {
        PushPlatform::Web => {
            let mut notification = json!({ "title": title, "body": body });
            if let Some(icon) = icon {
                notification["icon"] = json!(icon);
            }
            json!({
                "token": token,
                "webpush": { "notification": notification, "data": data },
            })
        }
        PushPlatform::Android => {
            let mut notification = json!({ "title": title, "body": body, "color": ANDROID_COLOR });
            if let Some(icon) = icon {
                notification["icon"] = json!(icon);
            }
            json!({
                "token": token,
                "data": data,
                "android": { "notification": notification },
            })
        }
        PushPlatform::Ios => {
            let mut apns = json!({
                "payload": {
                    "aps": {
                        "alert": { "title": title, "body": body },
                        "badge": 1,
                        "sound": "default",
                    }
                }
            });
            if let Some(icon) = icon {
                apns["fcm_options"] = json!({ "image": icon });
            }
            json!({ "token": token, "data": data, "apns": apns })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> PushData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_summary_defaults_to_body() {
        let filled = with_summary(&PushData::new(), "Order shipped");
        assert_eq!(filled["summary"], "Order shipped");

        let blank = with_summary(&data(&[("summary", "")]), "Order shipped");
        assert_eq!(blank["summary"], "Order shipped");
    }

    #[test]
    fn test_existing_summary_kept() {
        let kept = with_summary(&data(&[("summary", "Short")]), "Order shipped");
        assert_eq!(kept["summary"], "Short");
    }

    #[test]
    fn test_web_payload() {
        let message = build(PushPlatform::Web, "Hi", "Body", "tok", &PushData::new(), Some("/logo.png"));
        assert_eq!(message["token"], "tok");
        assert_eq!(message["webpush"]["notification"]["icon"], "/logo.png");
        assert_eq!(message["webpush"]["data"]["summary"], "Body");
        assert!(message.get("data").is_none());
    }

    #[test]
    fn test_android_payload() {
        let message = build(PushPlatform::Android, "Hi", "Body", "tok", &data(&[("id", "7")]), None);
        let notification = &message["android"]["notification"];
        assert_eq!(notification["color"], ANDROID_COLOR);
        assert_eq!(notification["title"], "Hi");
        assert!(notification.get("icon").is_none());
        assert_eq!(message["data"]["id"], "7");
        assert_eq!(message["data"]["summary"], "Body");
    }

    #[test]
    fn test_ios_payload() {
        let message = build(PushPlatform::Ios, "Hi", "Body", "tok", &PushData::new(), Some("https://cdn/logo.png"));
        let aps = &message["apns"]["payload"]["aps"];
        assert_eq!(aps["alert"]["title"], "Hi");
        assert_eq!(aps["alert"]["body"], "Body");
        assert_eq!(aps["badge"], 1);
        assert_eq!(aps["sound"], "default");
        assert_eq!(message["apns"]["fcm_options"]["image"], "https://cdn/logo.png");
    }
}
