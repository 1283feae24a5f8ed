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

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of a [`Message`](crate::message::Message).
///
/// The type decides which [`Payload`](crate::message::Payload) shape a message may carry.
/// Only `CONTENT`, `CONTENT_STREAM_CHUNK` and `ERRORS` carry a typed payload; the remaining
/// kinds are framing markers that carry nothing or untyped structured data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// A producer has begun work for the current run.
    Begin,
    /// One finished unit of output for the sender. Marks the sender complete.
    Content,
    /// One incremental fragment of output for the sender.
    ContentStreamChunk,
    /// A producer is about to stream chunks.
    ContentStreamBegin,
    /// A producer has finished streaming chunks.
    ContentStreamEnd,
    /// One or more errors reported by the sender. Terminal for the run.
    Errors,
}

impl MessageType {
    /// Returns the wire name of this type, e.g. `CONTENT_STREAM_CHUNK`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Begin => "BEGIN",
            Self::Content => "CONTENT",
            Self::ContentStreamChunk => "CONTENT_STREAM_CHUNK",
            Self::ContentStreamBegin => "CONTENT_STREAM_BEGIN",
            Self::ContentStreamEnd => "CONTENT_STREAM_END",
            Self::Errors => "ERRORS",
        }
    }

    /// True for the framing markers that never carry a typed payload.
    #[must_use]
    pub const fn is_marker(&self) -> bool {
        matches!(
            self,
            Self::Begin | Self::ContentStreamBegin | Self::ContentStreamEnd
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
