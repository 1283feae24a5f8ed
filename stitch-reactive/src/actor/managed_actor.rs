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

use std::any::Any;
use std::panic::AssertUnwindSafe;

use anyhow::anyhow;
use futures::FutureExt;
use tracing::{debug, instrument, trace};

use crate::actor::lifecycle::ActorState;
use crate::actor::ActorHandle;
use crate::common::config::CONFIG;
use crate::common::types::{channel, ChannelReceiver};
use crate::message::{Inbound, Message, SystemSignal};
use crate::traits::PipelineActor;

/// Runs a [`PipelineActor`] on its own processing task.
///
/// The managed actor owns the model exclusively. Every hook (`reset`, `on_receive`,
/// `on_error`, `on_stop`) is invoked from the one processing task, in inbox order, so the
/// model's run state has a single writer and needs no locking.
///
/// # Lifecycle
///
/// 1. [`new`](Self::new) creates the inbox and the [`ActorHandle`]. Messages may be sent
///    through the handle before the actor starts; they are buffered.
/// 2. [`start`](Self::start) resets the model and spawns the processing task.
/// 3. The task handles inbox items until the handle's stop is requested, or until every
///    handle is dropped. On a stop it first handles whatever the inbox already holds, then
///    invokes `on_stop` exactly once.
///
/// A failure escaping `on_receive` (an `Err` or a panic) is handed to `on_error`; the
/// actor then drops further messages until the next reset.
pub struct ManagedActor<A: PipelineActor> {
    model: A,
    inbox: ChannelReceiver<Inbound>,
    handle: ActorHandle,
}

impl<A: PipelineActor> std::fmt::Debug for ManagedActor<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedActor")
            .field("id", &self.model.id())
            .field("state", &self.handle.state())
            .finish_non_exhaustive()
    }
}

impl<A: PipelineActor> ManagedActor<A> {
    /// Wraps `model`, creating its inbox.
    ///
    /// The inbox is bounded by the model's configured capacity, falling back to
    /// `limits.actor_inbox_capacity` from the global configuration.
    pub fn new(model: A) -> Self {
        let capacity = model
            .config()
            .inbox_capacity()
            .or(CONFIG.limits.actor_inbox_capacity);
        let (outbox, inbox) = channel(capacity);
        let handle = ActorHandle::new(model.id(), outbox);
        Self {
            model,
            inbox,
            handle,
        }
    }

    /// Returns the actor's id.
    pub fn id(&self) -> &str {
        self.model.id()
    }

    /// Returns a handle to the actor.
    pub fn handle(&self) -> ActorHandle {
        self.handle.clone()
    }

    /// Borrows the model before it starts.
    pub fn model(&self) -> &A {
        &self.model
    }

    /// Resets the model and spawns its processing task.
    ///
    /// Must be called within a Tokio runtime.
    #[instrument(skip(self), fields(actor = %self.model.id()))]
    pub fn start(mut self) -> ActorHandle {
        trace!("Starting actor");
        self.model.reset();
        let actor_ref = self.handle.clone();
        actor_ref.state.advance(ActorState::Running);
        actor_ref.tracker().spawn(self.wake());
        actor_ref.tracker().close();
        actor_ref
    }

    #[instrument(skip(self), fields(actor = %self.model.id()))]
    async fn wake(self) {
        let Self {
            mut model,
            mut inbox,
            handle,
        } = self;
        let cancel_token = handle.cancellation_token.clone();
        let state = handle.state.clone();
        // Only external handles keep the inbox open.
        drop(handle);

        let mut failed = false;
        loop {
            tokio::select! {
                biased;

                () = cancel_token.cancelled() => {
                    trace!("Stop requested, draining accepted messages");
                    while let Some(inbound) = inbox.try_recv() {
                        handle_inbound(&mut model, inbound, &mut failed).await;
                    }
                    model.on_stop().await;
                    break;
                }

                incoming = inbox.recv() => {
                    let Some(inbound) = incoming else {
                        debug!("All handles dropped, stopping");
                        model.on_stop().await;
                        break;
                    };
                    handle_inbound(&mut model, inbound, &mut failed).await;
                }
            }
        }

        inbox.close();
        state.advance(ActorState::Stopped);
        trace!("Processing task finished");
    }
}

/// Applies one inbox item. After a handler failure, messages are dropped until a reset.
async fn handle_inbound<A: PipelineActor>(model: &mut A, inbound: Inbound, failed: &mut bool) {
    match inbound {
        Inbound::Signal(SystemSignal::Reset) => {
            trace!("Resetting run state");
            model.reset();
            *failed = false;
        }
        Inbound::Message(message) => {
            if *failed {
                debug!(
                    sender = %message.sender(),
                    message_type = %message.message_type(),
                    "Run failed, dropping message until reset"
                );
                return;
            }
            *failed = !dispatch(model, &message).await;
        }
    }
}

/// Hands one message to the model. Returns `false` if the handler failed.
async fn dispatch<A: PipelineActor>(model: &mut A, message: &Message) -> bool {
    trace!(
        sender = %message.sender(),
        message_type = %message.message_type(),
        "Dispatching message"
    );
    let outcome = AssertUnwindSafe(model.on_receive(message))
        .catch_unwind()
        .await;
    let error = match outcome {
        Ok(Ok(())) => return true,
        Ok(Err(error)) => error,
        Err(panic) => anyhow!("message handler panicked: {}", panic_message(panic.as_ref())),
    };
    model.on_error(error).await;
    false
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}
