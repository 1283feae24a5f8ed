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

use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{instrument, trace, warn};

use crate::actor::lifecycle::{ActorState, SharedActorState};
use crate::common::config::CONFIG;
use crate::common::types::ChannelSender;
use crate::message::{DispatchError, Inbound, Message, SystemSignal};

/// A clonable handle for interacting with a running pipeline actor.
///
/// `ActorHandle` is how everything outside an actor's processing task reaches it: delivering
/// messages to its inbox, resetting it between runs, and stopping it. Handles can be cloned
/// freely and shared across tasks.
///
/// Messages and reset signals travel through the same inbox, so a reset is observed exactly
/// between the messages sent before and after it. Stopping is level-triggered and cannot be
/// undone; messages the inbox accepted before the stop are still handled ahead of `on_stop`.
///
/// Equality is based solely on the actor's id.
#[derive(Debug, Clone)]
pub struct ActorHandle {
    id: Arc<str>,
    outbox: ChannelSender<Inbound>,
    tracker: TaskTracker,
    pub(crate) cancellation_token: CancellationToken,
    pub(crate) state: SharedActorState,
}

impl PartialEq for ActorHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ActorHandle {}

impl ActorHandle {
    pub(crate) fn new(id: &str, outbox: ChannelSender<Inbound>) -> Self {
        Self {
            id: Arc::from(id),
            outbox,
            tracker: TaskTracker::new(),
            cancellation_token: CancellationToken::new(),
            state: SharedActorState::default(),
        }
    }

    /// Returns the actor's id.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the actor's current lifecycle state.
    pub fn state(&self) -> ActorState {
        self.state.get()
    }

    /// Returns `true` once a stop has been requested, whether or not the task has finished.
    pub fn is_stopping(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    pub(crate) fn tracker(&self) -> TaskTracker {
        self.tracker.clone()
    }

    /// Delivers a message to the actor's inbox.
    ///
    /// Never waits on an unbounded inbox; on a bounded inbox waits for free capacity.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Closed`] if the actor's processing task has ended.
    #[instrument(skip(self, message), fields(actor = %self.id, message_type = %message.message_type()))]
    pub async fn send(&self, message: Message) -> Result<(), DispatchError> {
        trace!(sender = %message.sender(), "Delivering message");
        self.outbox
            .send(Inbound::from(message))
            .await
            .map_err(|_| DispatchError::Closed(self.id.to_string()))
    }

    /// Delivers a message without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Full`] if a bounded inbox has no free capacity and
    /// [`DispatchError::Closed`] if the actor's processing task has ended.
    pub fn try_send(&self, message: Message) -> Result<(), DispatchError> {
        self.outbox
            .try_send(Inbound::from(message))
            .map_err(|e| match e {
                TrySendError::Full(_) => DispatchError::Full(self.id.to_string()),
                TrySendError::Closed(_) => DispatchError::Closed(self.id.to_string()),
            })
    }

    /// Asks the actor to reinitialize its run state.
    ///
    /// The reset is ordered with messages: everything sent before it belongs to the previous
    /// run, everything sent after it to the new one.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Closed`] if the actor's processing task has ended.
    #[instrument(skip(self), fields(actor = %self.id))]
    pub async fn reset(&self) -> Result<(), DispatchError> {
        trace!("Sending Reset signal");
        self.outbox
            .send(Inbound::from(SystemSignal::Reset))
            .await
            .map_err(|_| DispatchError::Closed(self.id.to_string()))
    }

    /// Requests a stop without waiting for it to complete.
    ///
    /// Safe to call from any context, any number of times, including while the actor is
    /// handling a message; the actor stops once the messages already in its inbox are handled.
    pub fn request_stop(&self) {
        self.cancellation_token.cancel();
    }

    /// Stops the actor and waits for its processing task to finish.
    ///
    /// Waits at most `timeouts.actor_shutdown_ms` from the global configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the processing task does not finish within the shutdown timeout.
    #[instrument(skip(self), fields(actor = %self.id))]
    pub async fn stop(&self) -> anyhow::Result<()> {
        self.request_stop();
        if self.state.get() == ActorState::Fresh {
            self.state.advance(ActorState::Stopped);
            trace!("Actor was never started");
            return Ok(());
        }
        let timeout = CONFIG.actor_shutdown_timeout();
        if tokio::time::timeout(timeout, self.tracker.wait()).await.is_err() {
            warn!(?timeout, "Actor did not stop in time");
            return Err(anyhow!(
                "actor `{}` did not stop within {:?}",
                self.id,
                timeout
            ));
        }
        trace!("Actor stopped");
        Ok(())
    }

    /// Returns `true` once the actor's inbox no longer accepts messages.
    pub fn is_closed(&self) -> bool {
        self.outbox.is_closed()
    }
}
