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

use thiserror::Error;

use crate::message::MessageType;

/// Errors raised while constructing a [`Message`](crate::message::Message).
///
/// Construction is the only place a message can be rejected; once built, a message is
/// immutable and always internally consistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// The sender identifier was empty or whitespace.
    #[error("message sender must not be empty")]
    EmptySender,
    /// A `CONTENT`, `CONTENT_STREAM_CHUNK` or `ERRORS` message arrived without its payload.
    #[error("{message_type} message requires a {expected} payload")]
    MissingPayload {
        /// The declared message type.
        message_type: MessageType,
        /// The payload shape that type requires.
        expected: &'static str,
    },
    /// The attached payload does not match the declared type.
    #[error("{message_type} message cannot carry a {found} payload (expected {expected})")]
    PayloadMismatch {
        /// The declared message type.
        message_type: MessageType,
        /// The payload shape that type requires.
        expected: &'static str,
        /// The payload shape that was attached.
        found: &'static str,
    },
}

/// Errors raised while delivering a message or signal to an actor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The actor's processing task has ended and its inbox is closed.
    #[error("actor `{0}` is no longer accepting messages")]
    Closed(String),
    /// A bounded inbox was full and the caller asked not to wait.
    #[error("actor `{0}` inbox is full")]
    Full(String),
    /// No actor is registered under the addressed id.
    #[error("no actor registered as `{0}`")]
    UnknownReceiver(String),
    /// An actor with the same id is already registered.
    #[error("an actor is already registered as `{0}`")]
    DuplicateActor(String),
}
