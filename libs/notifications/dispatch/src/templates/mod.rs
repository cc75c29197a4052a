//! Email template rendering.
//!
//! Templates are MJML documents with Handlebars placeholders, held in a
//! fixed registry compiled into the binary. Rendering runs three stages:
//!
//! 1. Handlebars interpolation of the context (missing keys render empty)
//! 2. MJML to HTML conversion with `mrml`
//! 3. Plaintext derivation from the HTML (see [`text`])
//!
//! Structural problems that `mrml` reports as warnings are logged and the
//! render continues with whatever output the parser produced. Only hard
//! failures (unknown template, unparseable markup) abort.

pub mod text;

use crate::error::{NotificationError, NotificationResult};
use handlebars::Handlebars;
use mrml::prelude::render::RenderOptions;
use serde_json::Value;
use tracing::{debug, warn};

/// Name of the operator alert sent by the error-capture pipeline.
pub const SERVER_ERROR_TEMPLATE: &str = "server-error";

/// Column at which the plaintext body is wrapped.
pub const TEXT_WRAP_WIDTH: usize = 130;

/// Template name to MJML source.
pub type TemplateRegistry = &'static [(&'static str, &'static str)];

/// Templates shipped with the service.
pub static TEMPLATES: TemplateRegistry = &[(
    SERVER_ERROR_TEMPLATE,
    include_str!("server_error.mjml"),
)];

/// Rendered email bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub html: String,
    pub text: String,
}

/// Renders registry templates to HTML and plaintext.
///
/// Immutable once built; share it behind an `Arc`.
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl TemplateRenderer {
    /// Create a renderer over the built-in [`TEMPLATES`].
    pub fn new() -> NotificationResult<Self> {
        Self::from_registry(TEMPLATES)
    }

    /// Create a renderer over an explicit registry.
    pub fn from_registry(registry: TemplateRegistry) -> NotificationResult<Self> {
        let mut handlebars = Handlebars::new();

        for (name, source) in registry {
            handlebars
                .register_template_string(name, source)
                .map_err(|e| {
                    NotificationError::Render(format!("Failed to register {name}: {e}"))
                })?;
        }

        Ok(Self { handlebars })
    }

    /// Check if a template exists
    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }

    /// Render `name` against `context`.
    pub fn render(&self, name: &str, context: &Value) -> NotificationResult<RenderedEmail> {
        if !self.has_template(name) {
            return Err(NotificationError::TemplateNotFound(name.to_string()));
        }

        let markup = self.handlebars.render(name, context)?;

        let parsed = mrml::parse(&markup).map_err(|e| NotificationError::Render(e.to_string()))?;
        for warning in &parsed.warnings {
            warn!(template = name, warning = ?warning, "MJML structural warning");
        }

        let html = parsed
            .element
            .render(&RenderOptions::default())
            .map_err(|e| NotificationError::Render(e.to_string()))?;

        let text = text::html_to_text(&html, TEXT_WRAP_WIDTH);

        debug!(
            template = name,
            html_len = html.len(),
            text_len = text.len(),
            "Rendered email template"
        );

        Ok(RenderedEmail { html, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static TEST_TEMPLATES: TemplateRegistry = &[
        (
            "greeting",
            r#"<mjml><mj-body><mj-section><mj-column>
                <mj-text>Hello {{name}}, your code is {{code}}.</mj-text>
                <mj-image src="https://cdn.example.com/logo.png" alt="logo" />
                <mj-text><a href="https://example.com">https://example.com</a> and <a href="https://example.com/help">help</a></mj-text>
            </mj-column></mj-section></mj-body></mjml>"#,
        ),
        (
            "loose",
            r#"<mjml><mj-body><mj-section><mj-column>
                <mj-text unknown-attribute="1">Still rendered {{value}}</mj-text>
            </mj-column></mj-section></mj-body></mjml>"#,
        ),
    ];

    #[test]
    fn test_builtin_registry_has_server_error() {
        let renderer = TemplateRenderer::new().unwrap();
        assert!(renderer.has_template(SERVER_ERROR_TEMPLATE));
        assert!(!renderer.has_template("welcome"));
    }

    #[test]
    fn test_unknown_template_is_not_found() {
        let renderer = TemplateRenderer::new().unwrap();
        let err = renderer.render("does-not-exist", &json!({})).unwrap_err();
        assert!(matches!(err, NotificationError::TemplateNotFound(name) if name == "does-not-exist"));
    }

    #[test]
    fn test_server_error_renders_with_empty_context() {
        let renderer = TemplateRenderer::new().unwrap();
        let rendered = renderer.render(SERVER_ERROR_TEMPLATE, &json!({})).unwrap();

        assert!(rendered.html.contains("Server Error Alert"));
        assert!(rendered.text.contains("Server Error Alert"));
        assert!(!rendered.html.contains("{{"));
    }

    #[test]
    fn test_server_error_text_keeps_empty_sections_apart() {
        let renderer = TemplateRenderer::new().unwrap();
        let rendered = renderer.render(SERVER_ERROR_TEMPLATE, &json!({})).unwrap();

        assert!(!rendered.text.contains("Query Parameters:Request Body:"));
        assert!(rendered.text.contains("Headers:\n\n(none)"));
        assert!(rendered.text.contains("Query Parameters:\n\n(none)"));
        assert!(rendered.text.contains("Request Body:\n\n(none)"));
    }

    #[test]
    fn test_server_error_interpolates_context() {
        let renderer = TemplateRenderer::new().unwrap();
        let context = json!({
            "errorCode": 500,
            "errorMessage": "database unreachable",
            "requestMethod": "GET",
            "requestUrl": "/names",
            "stackTrace": "→ cedar_api::handler\n  File: handler.rs",
        });

        let rendered = renderer.render(SERVER_ERROR_TEMPLATE, &context).unwrap();
        assert!(rendered.html.contains("database unreachable"));
        assert!(rendered.text.contains("database unreachable"));
        assert!(rendered.text.contains("GET /names"));
        assert!(rendered.text.contains("  File: handler.rs"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = TemplateRenderer::from_registry(TEST_TEMPLATES).unwrap();
        let context = json!({"name": "Ada", "code": 42});

        let first = renderer.render("greeting", &context).unwrap();
        let second = renderer.render("greeting", &context).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_keys_render_empty() {
        let renderer = TemplateRenderer::from_registry(TEST_TEMPLATES).unwrap();
        let rendered = renderer.render("greeting", &json!({"name": "Ada"})).unwrap();
        assert!(rendered.text.contains("Hello Ada, your code is ."));
    }

    #[test]
    fn test_text_skips_images_and_duplicate_hrefs() {
        let renderer = TemplateRenderer::from_registry(TEST_TEMPLATES).unwrap();
        let rendered = renderer.render("greeting", &json!({"name": "Ada"})).unwrap();

        assert!(!rendered.text.contains("logo.png"));
        assert!(!rendered.text.contains("[https://example.com]"));
        assert!(rendered.text.contains("help [https://example.com/help]"));
    }

    #[test]
    fn test_loosely_structured_markup_still_renders() {
        let renderer = TemplateRenderer::from_registry(TEST_TEMPLATES).unwrap();
        let rendered = renderer.render("loose", &json!({"value": "ok"})).unwrap();
        assert!(rendered.text.contains("Still rendered ok"));
    }

    #[test]
    fn test_invalid_handlebars_fails_registration() {
        let err = TemplateRenderer::from_registry(&[("broken", "{{#if open}}")])
            .err()
            .unwrap();
        assert!(matches!(err, NotificationError::Render(_)));
    }

    #[test]
    fn test_unparseable_markup_is_render_error() {
        let renderer = TemplateRenderer::from_registry(&[("plain", "not mjml {{x}}")]).unwrap();
        let err = renderer.render("plain", &json!({"x": 1})).unwrap_err();
        assert!(matches!(err, NotificationError::Render(_)));
    }
}
