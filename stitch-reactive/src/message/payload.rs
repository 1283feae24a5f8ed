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

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error code used when a producer does not supply one.
pub const DEFAULT_ERROR_CODE: i64 = -1;

const fn default_error_code() -> i64 {
    DEFAULT_ERROR_CODE
}

/// A single error reported by a producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Producer-defined error code, `-1` when unspecified.
    #[serde(default = "default_error_code")]
    pub code: i64,
    /// Human-readable description surfaced to the consumer.
    pub message: String,
}

impl ErrorDetail {
    /// Creates an error with the default code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: DEFAULT_ERROR_CODE,
            message: message.into(),
        }
    }

    /// Creates an error with an explicit code.
    pub fn with_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Payload of a `CONTENT` message: the sender's finished output for the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentData {
    /// The final value, already normalized to plain structured data.
    pub content: Value,
}

/// Payload of a `CONTENT_STREAM_CHUNK` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentStreamChunkData {
    /// One incremental fragment of the sender's output.
    pub chunk: Value,
}

/// Payload of an `ERRORS` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorsData {
    /// Ordered list of errors, as reported.
    pub errors: Vec<ErrorDetail>,
}

/// The data carried by a [`Message`](crate::message::Message).
///
/// Exactly one shape is valid for each [`MessageType`](crate::message::MessageType); the
/// pairing is checked when the message is built, so a handler matching on the type can rely
/// on the payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Final content for a sender.
    Content(ContentData),
    /// Incremental chunk for a sender.
    ContentStreamChunk(ContentStreamChunkData),
    /// Errors reported by a sender.
    Errors(ErrorsData),
    /// Untyped structured data, allowed on framing markers only.
    Data(Value),
}

impl Payload {
    /// Short name of the active variant, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Content(_) => "content",
            Self::ContentStreamChunk(_) => "chunk",
            Self::Errors(_) => "errors",
            Self::Data(_) => "data",
        }
    }
}

impl From<ErrorsData> for Payload {
    fn from(value: ErrorsData) -> Self {
        Self::Errors(value)
    }
}

impl From<ContentData> for Payload {
    fn from(value: ContentData) -> Self {
        Self::Content(value)
    }
}

impl From<ContentStreamChunkData> for Payload {
    fn from(value: ContentStreamChunkData) -> Self {
        Self::ContentStreamChunk(value)
    }
}
