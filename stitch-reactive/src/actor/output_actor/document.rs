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

use std::collections::BTreeSet;
use std::fmt;

use serde_json::{Map, Value};

use crate::common::{stitch, StitchError};

/// Where the output actor is within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AggregatorState {
    /// Merging chunks and recording final content.
    #[default]
    Collecting,
    /// The success fragment is queued; the consumer is draining what is left.
    Draining,
    /// An upstream error ended the run.
    ErrorTerminal,
    /// A stop ended the run.
    StoppedTerminal,
}

impl AggregatorState {
    /// Returns `true` when no further contributions are accepted.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Collecting)
    }
}

impl fmt::Display for AggregatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Collecting => "collecting",
            Self::Draining => "draining",
            Self::ErrorTerminal => "error-terminal",
            Self::StoppedTerminal => "stopped-terminal",
        };
        f.write_str(name)
    }
}

/// The accumulated state of one run.
///
/// Created empty at reset and owned by the output actor's processing task for the life of
/// the run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedDocument {
    stitched: Map<String, Value>,
    rendered_output: String,
    messages_by_sender: Map<String, Value>,
}

impl AggregatedDocument {
    /// The merged structured document.
    pub const fn stitched(&self) -> &Map<String, Value> {
        &self.stitched
    }

    /// The last successfully rendered text.
    pub fn rendered_output(&self) -> &str {
        &self.rendered_output
    }

    /// Final content received so far, keyed by sender.
    pub const fn messages_by_sender(&self) -> &Map<String, Value> {
        &self.messages_by_sender
    }

    /// Returns the document with `chunk` from `sender` merged in, leaving `self` untouched.
    pub(crate) fn stitch_chunk(
        &self,
        sender: &str,
        chunk: &Value,
        spread: bool,
    ) -> Result<Map<String, Value>, StitchError> {
        stitch(&self.stitched, sender, chunk, spread)
    }

    pub(crate) fn replace_stitched(&mut self, stitched: Map<String, Value>) {
        self.stitched = stitched;
    }

    /// Stores a new rendering and returns the previous one.
    pub(crate) fn replace_rendered(&mut self, rendered: String) -> String {
        std::mem::replace(&mut self.rendered_output, rendered)
    }

    /// Records a sender's final content, replacing any earlier value.
    pub(crate) fn record_content(&mut self, sender: &str, content: Value) {
        self.messages_by_sender.insert(sender.to_owned(), content);
    }

    /// Returns `true` once every dependency, and nothing else, has delivered final content.
    pub(crate) fn is_complete(&self, dependencies: &BTreeSet<String>) -> bool {
        self.messages_by_sender.len() == dependencies.len()
            && dependencies
                .iter()
                .all(|dependency| self.messages_by_sender.contains_key(dependency))
    }
}
