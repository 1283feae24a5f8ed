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
use static_assertions::assert_impl_all;
use uuid::Uuid;

use crate::message::{
    ContentData, ContentStreamChunkData, ErrorDetail, ErrorsData, MessageError, MessageType,
    Payload,
};

/// The immutable envelope exchanged between pipeline actors.
///
/// A `Message` is validated when it is built: the sender must be non-empty and the attached
/// [`Payload`] must be the shape its [`MessageType`] requires. Fields are private and only
/// exposed through accessors, so a received message cannot be altered in place.
///
/// ```rust
/// use serde_json::json;
/// use stitch_reactive::prelude::*;
///
/// let chunk = Message::chunk("search", json!({"hits": 3})).unwrap();
/// assert_eq!(chunk.message_type(), MessageType::ContentStreamChunk);
/// assert_eq!(chunk.chunk_value(), Some(&json!({"hits": 3})));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMessage")]
pub struct Message {
    id: String,
    #[serde(rename = "type")]
    message_type: MessageType,
    sender: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    receiver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Payload>,
}

assert_impl_all!(Message: Send, Sync, Clone);

impl Message {
    /// Starts building a message of the given type from `sender`.
    pub fn builder(message_type: MessageType, sender: impl Into<String>) -> MessageBuilder {
        MessageBuilder {
            id: None,
            message_type,
            sender: sender.into(),
            receiver: None,
            reply_to: None,
            data: None,
        }
    }

    /// A `BEGIN` marker without payload.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::EmptySender`] if `sender` is empty.
    pub fn begin(sender: impl Into<String>) -> Result<Self, MessageError> {
        Self::builder(MessageType::Begin, sender).build()
    }

    /// A `CONTENT_STREAM_BEGIN` marker without payload.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::EmptySender`] if `sender` is empty.
    pub fn stream_begin(sender: impl Into<String>) -> Result<Self, MessageError> {
        Self::builder(MessageType::ContentStreamBegin, sender).build()
    }

    /// A `CONTENT_STREAM_END` marker without payload.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::EmptySender`] if `sender` is empty.
    pub fn stream_end(sender: impl Into<String>) -> Result<Self, MessageError> {
        Self::builder(MessageType::ContentStreamEnd, sender).build()
    }

    /// A `CONTENT` message carrying the sender's final value.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::EmptySender`] if `sender` is empty.
    pub fn content(sender: impl Into<String>, content: Value) -> Result<Self, MessageError> {
        Self::builder(MessageType::Content, sender)
            .payload(ContentData { content })
            .build()
    }

    /// A `CONTENT_STREAM_CHUNK` message carrying one incremental fragment.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::EmptySender`] if `sender` is empty.
    pub fn chunk(sender: impl Into<String>, chunk: Value) -> Result<Self, MessageError> {
        Self::builder(MessageType::ContentStreamChunk, sender)
            .payload(ContentStreamChunkData { chunk })
            .build()
    }

    /// An `ERRORS` message carrying the given errors in order.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::EmptySender`] if `sender` is empty.
    pub fn errors(
        sender: impl Into<String>,
        errors: impl IntoIterator<Item = ErrorDetail>,
    ) -> Result<Self, MessageError> {
        Self::builder(MessageType::Errors, sender)
            .payload(ErrorsData {
                errors: errors.into_iter().collect(),
            })
            .build()
    }

    /// Unique identifier of this message.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The message kind.
    #[inline]
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Identifier of the originating actor. Never empty.
    #[inline]
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Target actor, or `None` for broadcast.
    #[inline]
    #[must_use]
    pub fn receiver(&self) -> Option<&str> {
        self.receiver.as_deref()
    }

    /// Identifier of the message this one answers. A causality hint only.
    #[inline]
    #[must_use]
    pub fn reply_to(&self) -> Option<&str> {
        self.reply_to.as_deref()
    }

    /// The validated payload, if any.
    #[inline]
    #[must_use]
    pub const fn payload(&self) -> Option<&Payload> {
        self.data.as_ref()
    }

    /// The final value of a `CONTENT` message.
    #[must_use]
    pub fn content_value(&self) -> Option<&Value> {
        match &self.data {
            Some(Payload::Content(data)) => Some(&data.content),
            _ => None,
        }
    }

    /// The fragment of a `CONTENT_STREAM_CHUNK` message.
    #[must_use]
    pub fn chunk_value(&self) -> Option<&Value> {
        match &self.data {
            Some(Payload::ContentStreamChunk(data)) => Some(&data.chunk),
            _ => None,
        }
    }

    /// The reported errors of an `ERRORS` message.
    #[must_use]
    pub fn error_details(&self) -> Option<&[ErrorDetail]> {
        match &self.data {
            Some(Payload::Errors(data)) => Some(&data.errors),
            _ => None,
        }
    }

    /// True when the message is addressed to `actor_id` or broadcast.
    #[must_use]
    pub fn is_for(&self, actor_id: &str) -> bool {
        self.receiver.as_deref().map_or(true, |receiver| receiver == actor_id)
    }
}

/// Builder for [`Message`], used when a receiver, reply link or explicit id is needed.
#[derive(Debug, Clone)]
#[must_use]
pub struct MessageBuilder {
    id: Option<String>,
    message_type: MessageType,
    sender: String,
    receiver: Option<String>,
    reply_to: Option<String>,
    data: Option<Payload>,
}

impl MessageBuilder {
    /// Overrides the generated id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Addresses the message to a single actor.
    pub fn receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }

    /// Links the message to an earlier one.
    pub fn reply_to(mut self, message_id: impl Into<String>) -> Self {
        self.reply_to = Some(message_id.into());
        self
    }

    /// Attaches a payload.
    pub fn payload(mut self, payload: impl Into<Payload>) -> Self {
        self.data = Some(payload.into());
        self
    }

    /// Attaches untyped structured data (framing markers only).
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(Payload::Data(data));
        self
    }

    /// Validates and builds the message.
    ///
    /// # Errors
    ///
    /// * [`MessageError::EmptySender`] when the sender is blank.
    /// * [`MessageError::MissingPayload`] when a typed message has no payload.
    /// * [`MessageError::PayloadMismatch`] when the payload shape does not match the type.
    pub fn build(self) -> Result<Message, MessageError> {
        if self.sender.trim().is_empty() {
            return Err(MessageError::EmptySender);
        }
        let data = validate_payload(self.message_type, self.data)?;
        Ok(Message {
            id: self
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            message_type: self.message_type,
            sender: self.sender,
            receiver: self.receiver,
            reply_to: self.reply_to,
            data,
        })
    }
}

fn validate_payload(
    message_type: MessageType,
    data: Option<Payload>,
) -> Result<Option<Payload>, MessageError> {
    let expected = match message_type {
        MessageType::Content => "content",
        MessageType::ContentStreamChunk => "chunk",
        MessageType::Errors => "errors",
        MessageType::Begin | MessageType::ContentStreamBegin | MessageType::ContentStreamEnd => {
            return Ok(data.map(into_untyped));
        }
    };
    match data {
        None => Err(MessageError::MissingPayload {
            message_type,
            expected,
        }),
        Some(payload) if payload.kind() == expected => Ok(Some(payload)),
        Some(payload) => Err(MessageError::PayloadMismatch {
            message_type,
            expected,
            found: payload.kind(),
        }),
    }
}

// Markers only ever carry untyped data, whatever shape it happened to parse as.
fn into_untyped(payload: Payload) -> Payload {
    match payload {
        Payload::Data(value) => Payload::Data(value),
        other => Payload::Data(serde_json::to_value(&other).unwrap_or(Value::Null)),
    }
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    message_type: MessageType,
    sender: String,
    #[serde(default)]
    receiver: Option<String>,
    #[serde(default)]
    reply_to: Option<String>,
    #[serde(default)]
    data: Option<Payload>,
}

impl TryFrom<RawMessage> for Message {
    type Error = MessageError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let mut builder = Self::builder(raw.message_type, raw.sender);
        builder.id = raw.id;
        builder.receiver = raw.receiver;
        builder.reply_to = raw.reply_to;
        builder.data = raw.data;
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ids_are_generated_per_message() {
        let first = Message::begin("a").unwrap();
        let second = Message::begin("a").unwrap();
        assert_ne!(first.id(), second.id());
        assert!(!first.id().is_empty());
    }

    #[test]
    fn empty_sender_is_rejected() {
        assert_eq!(Message::begin("  "), Err(MessageError::EmptySender));
    }

    #[test]
    fn typed_messages_require_matching_payload() {
        let missing = Message::builder(MessageType::Content, "a").build();
        assert!(matches!(missing, Err(MessageError::MissingPayload { .. })));

        let mismatched = Message::builder(MessageType::ContentStreamChunk, "a")
            .payload(ContentData {
                content: json!("x"),
            })
            .build();
        assert_eq!(
            mismatched,
            Err(MessageError::PayloadMismatch {
                message_type: MessageType::ContentStreamChunk,
                expected: "chunk",
                found: "content",
            })
        );

        let untyped = Message::builder(MessageType::Errors, "a")
            .data(json!({"oops": true}))
            .build();
        assert!(matches!(untyped, Err(MessageError::PayloadMismatch { .. })));
    }

    #[test]
    fn markers_accept_untyped_data() {
        let message = Message::builder(MessageType::Begin, "a")
            .data(json!({"run": 1}))
            .receiver("output")
            .reply_to("m-1")
            .build()
            .unwrap();
        assert_eq!(message.payload(), Some(&Payload::Data(json!({"run": 1}))));
        assert_eq!(message.receiver(), Some("output"));
        assert_eq!(message.reply_to(), Some("m-1"));
        assert!(message.is_for("output"));
        assert!(!message.is_for("other"));
    }

    #[test]
    fn errors_default_code() {
        let detail: ErrorDetail = serde_json::from_value(json!({"message": "boom"})).unwrap();
        assert_eq!(detail.code, -1);
        let message = Message::errors("a", [detail.clone()]).unwrap();
        assert_eq!(message.error_details(), Some(&[detail][..]));
    }

    #[test]
    fn deserializing_validates_payload() {
        let ok: Message = serde_json::from_value(json!({
            "type": "CONTENT_STREAM_CHUNK",
            "sender": "llm",
            "data": {"chunk": {"text": "he"}}
        }))
        .unwrap();
        assert_eq!(ok.chunk_value(), Some(&json!({"text": "he"})));
        assert!(!ok.id().is_empty());

        let bad = serde_json::from_value::<Message>(json!({
            "type": "CONTENT",
            "sender": "llm",
            "data": {"chunk": 1}
        }));
        assert!(bad.is_err());
    }
}
