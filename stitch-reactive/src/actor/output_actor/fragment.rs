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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::EditScript;

/// Terminal error text yielded when a run is stopped before it completes.
pub const OUTPUT_INTERRUPTED: &str = "Output interrupted";

/// One item of the consumer-facing output stream.
///
/// Serializes to exactly one of three JSON shapes:
///
/// ```json
/// {"deltas": {"output": "=5\t+ world"}, "chunk": {"llm": {"text": " world"}}}
/// {"output": "hello world", "chunks": {"llm": {"text": "hello world"}}}
/// {"errors": ["upstream failed"]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputFragment {
    /// An incremental update triggered by one stream chunk.
    Delta {
        /// Edit script per rendered template key.
        deltas: BTreeMap<String, EditScript>,
        /// The raw chunk, keyed by its sender.
        chunk: Map<String, Value>,
    },
    /// The terminal success fragment: every dependency delivered its final content.
    Complete {
        /// The full rendered output.
        output: String,
        /// Final content keyed by sender.
        chunks: Map<String, Value>,
    },
    /// The terminal failure fragment, for upstream errors and interruptions alike.
    Failed {
        /// Human-readable error messages.
        errors: Vec<String>,
    },
}

impl OutputFragment {
    pub(crate) fn delta(
        template_key: &str,
        edit: EditScript,
        sender: &str,
        chunk: Value,
    ) -> Self {
        let mut deltas = BTreeMap::new();
        deltas.insert(template_key.to_owned(), edit);
        let mut keyed = Map::new();
        keyed.insert(sender.to_owned(), chunk);
        Self::Delta {
            deltas,
            chunk: keyed,
        }
    }

    pub(crate) const fn complete(output: String, chunks: Map<String, Value>) -> Self {
        Self::Complete { output, chunks }
    }

    pub(crate) const fn failed(errors: Vec<String>) -> Self {
        Self::Failed { errors }
    }

    pub(crate) fn interrupted() -> Self {
        Self::failed(vec![OUTPUT_INTERRUPTED.to_owned()])
    }

    /// Returns `true` for fragments that end the stream.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Delta { .. })
    }

    /// Returns `true` if this is the interruption fragment produced by a stop.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Failed { errors } if errors.len() == 1 && errors[0] == OUTPUT_INTERRUPTED)
    }

    /// Converts the fragment to its JSON wire value.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Delta { deltas, chunk } => {
                let deltas: Map<String, Value> = deltas
                    .iter()
                    .map(|(key, edit)| (key.clone(), Value::String(edit.to_delta())))
                    .collect();
                serde_json::json!({ "deltas": deltas, "chunk": chunk })
            }
            Self::Complete { output, chunks } => {
                serde_json::json!({ "output": output, "chunks": chunks })
            }
            Self::Failed { errors } => serde_json::json!({ "errors": errors }),
        }
    }
}
