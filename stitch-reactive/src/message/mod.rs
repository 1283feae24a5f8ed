//! The typed message envelope exchanged between pipeline actors.
//!
//! * [`Message`]: the immutable envelope (id, type, sender, optional receiver and reply link,
//!   validated payload).
//! * [`MessageType`]: the closed set of message kinds.
//! * [`Payload`]: the tagged payload union, checked against the type at construction.
//! * [`MessageError`]: construction failures.
//! * [`DispatchError`]: delivery failures.

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

pub use envelope::{Message, MessageBuilder};
pub use message_error::{DispatchError, MessageError};
pub(crate) use signal::{Inbound, SystemSignal};
pub use message_type::MessageType;
pub use payload::{
    ContentData, ContentStreamChunkData, ErrorDetail, ErrorsData, Payload, DEFAULT_ERROR_CODE,
};

mod envelope;
mod message_error;
mod message_type;
mod payload;
mod signal;
