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

use std::fmt::Debug;

use serde_json::Value;

use crate::common::TemplateError;

/// Turns a template and structured data into text.
///
/// Implementations must be pure and must treat keys missing from `data` as blank rather than
/// failing. [`HandlebarsRenderer`](crate::common::HandlebarsRenderer) is the default.
pub trait Renderer: Send + Sync + Debug {
    /// Renders `template` against `data`.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] when the template itself is malformed.
    fn render(&self, template: &str, data: &Value) -> Result<String, TemplateError>;
}
