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

use crate::message::Message;

/// Control signals delivered through an actor's inbox.
///
/// Signals share the channel with ordinary messages so a reset is observed exactly between
/// the messages sent before and after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SystemSignal {
    /// Reinitialize run state and clear a failed run.
    Reset,
}

/// Everything an actor's processing task can receive.
#[derive(Debug, Clone)]
pub(crate) enum Inbound {
    Message(Message),
    Signal(SystemSignal),
}

impl From<Message> for Inbound {
    fn from(message: Message) -> Self {
        Self::Message(message)
    }
}

impl From<SystemSignal> for Inbound {
    fn from(signal: SystemSignal) -> Self {
        Self::Signal(signal)
    }
}
