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

use parking_lot::Mutex;
use serde_json::Value;
use stitch_reactive::prelude::*;

/// Keeps every bookkeeping record in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<BookkeepingData>>,
}

impl RecordingSink {
    pub fn outputs(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|record| record.output.clone())
            .collect()
    }
}

impl BookkeepingSink for RecordingSink {
    fn append(&self, record: BookkeepingData) -> Result<(), BookkeepingError> {
        self.records.lock().push(record);
        Ok(())
    }
}

/// A sink whose consumer is always gone.
#[derive(Debug, Default)]
pub struct ClosedSink;

impl BookkeepingSink for ClosedSink {
    fn append(&self, _record: BookkeepingData) -> Result<(), BookkeepingError> {
        Err(BookkeepingError::Closed)
    }
}

/// Renders with Handlebars, but fails while the data has `"poison": true` at the top level.
#[derive(Debug, Default)]
pub struct PoisonableRenderer {
    inner: HandlebarsRenderer,
}

impl Renderer for PoisonableRenderer {
    fn render(&self, template: &str, data: &Value) -> Result<String, TemplateError> {
        if data.get("poison").and_then(Value::as_bool) == Some(true) {
            return Err(TemplateError::MissingTemplate("poison".into()));
        }
        self.inner.render(template, data)
    }
}
