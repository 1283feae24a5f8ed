//! Handlebars-backed rendering of the aggregated document.

/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use handlebars::Handlebars;
use serde_json::Value;
use thiserror::Error;

use crate::traits::Renderer;

/// Errors produced while rendering a template.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The template failed to parse or render.
    #[error("Template rendering failed: {0}")]
    Render(#[from] handlebars::RenderError),

    /// No template is configured under the requested key.
    #[error("No template registered under `{0}`")]
    MissingTemplate(String),
}

/// A [`Renderer`] using Handlebars in non-strict mode.
///
/// Missing keys render as empty text and output is not HTML-escaped, so the rendered text is
/// exactly what the producers contributed.
#[derive(Debug)]
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_escape_fn(handlebars::no_escape);
        Self { registry }
    }
}

impl Renderer for HandlebarsRenderer {
    fn render(&self, template: &str, data: &Value) -> Result<String, TemplateError> {
        Ok(self.registry.render_template(template, data)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn renders_nested_values() {
        let renderer = HandlebarsRenderer::default();
        let out = renderer
            .render(
                "{{search.title}}: {{llm.text}}",
                &json!({"search": {"title": "Rust"}, "llm": {"text": "fast & safe"}}),
            )
            .unwrap();
        assert_eq!(out, "Rust: fast & safe");
    }

    #[test]
    fn missing_keys_render_blank() {
        let renderer = HandlebarsRenderer::default();
        assert_eq!(renderer.render("[{{nope.deeper}}]", &json!({})).unwrap(), "[]");
    }

    #[test]
    fn malformed_templates_error() {
        let renderer = HandlebarsRenderer::default();
        assert!(matches!(
            renderer.render("{{#if}}", &json!({})),
            Err(TemplateError::Render(_))
        ));
    }
}
