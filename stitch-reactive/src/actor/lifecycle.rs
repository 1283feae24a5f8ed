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
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Where a managed actor is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorState {
    /// Created, processing task not yet spawned.
    Fresh,
    /// Processing task running and accepting messages.
    Running,
    /// Processing task finished. Terminal.
    Stopped,
}

impl ActorState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Fresh,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for ActorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fresh => "fresh",
            Self::Running => "running",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Crate-internal: an actor state shared between the processing task and its handles.
///
/// Only moves forward; once `Stopped` it stays `Stopped`.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedActorState(Arc<AtomicU8>);

impl SharedActorState {
    pub(crate) fn get(&self) -> ActorState {
        ActorState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn advance(&self, state: ActorState) {
        self.0.fetch_max(state as u8, Ordering::AcqRel);
    }
}
