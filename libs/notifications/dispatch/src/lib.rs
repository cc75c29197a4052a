//! Multi-channel notification dispatch.
//!
//! Each channel family (email, SMS, push, payment) has a facade that resolves
//! exactly one provider adapter when it is built and delegates every call to
//! it. Facades are cheap to clone and safe to share across tasks.
//!
//! ```no_run
//! use notifications::{EmailDispatch, TemplateRenderer, SERVER_ERROR_TEMPLATE};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn run() -> notifications::NotificationResult<()> {
//! let renderer = Arc::new(TemplateRenderer::new()?);
//! let email = EmailDispatch::from_env(renderer)?;
//! email
//!     .send(
//!         "Application Error",
//!         SERVER_ERROR_TEMPLATE,
//!         &["ops@cedar.io".to_string()],
//!         &json!({ "errorMessage": "boom" }),
//!         &[],
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod attachment;
pub mod email;
pub mod error;
mod http;
pub mod payment;
pub mod push;
pub mod sanitize;
pub mod sms;
pub mod templates;

pub use attachment::Attachment;
pub use email::{EmailDispatch, EmailProvider, EmailProviderConfig, EmailProviderKind};
pub use error::{NotificationError, NotificationResult};
pub use payment::{
    PaymentDispatch, PaymentOptions, PaymentProvider, PaymentProviderConfig, PaymentProviderKind,
    PaymentSession, PaymentStatus,
};
pub use push::{FcmClient, PushData, PushDispatch, PushGateway, PushPlatform};
pub use sanitize::sanitize;
pub use sms::{SmsDispatch, SmsProvider, SmsProviderConfig, SmsProviderKind, SmsReceipt};
pub use templates::{RenderedEmail, TemplateRenderer, SERVER_ERROR_TEMPLATE};
