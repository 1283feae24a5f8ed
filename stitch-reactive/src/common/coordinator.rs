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
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::join_all;
use tracing::{debug, instrument, trace, warn};

use crate::actor::ActorHandle;
use crate::message::{DispatchError, Message};

/// An in-process dispatch surface for one pipeline.
///
/// The `Coordinator` keeps a registry of actor handles keyed by id and routes each
/// [`Message`]: to its `receiver` when one is set, otherwise to every registered actor
/// except the sender. Delivery to one actor never waits on another actor's handler; each
/// actor processes its inbox on its own task.
///
/// Messages dispatched one after another reach every actor in that order.
///
/// Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct Coordinator {
    actors: Arc<DashMap<String, ActorHandle>>,
}

impl Coordinator {
    /// Creates an empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an actor under its id.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateActor`] if the id is already taken.
    pub fn register(&self, handle: ActorHandle) -> Result<(), DispatchError> {
        match self.actors.entry(handle.id().to_owned()) {
            Entry::Occupied(entry) => Err(DispatchError::DuplicateActor(entry.key().clone())),
            Entry::Vacant(entry) => {
                trace!(actor = %handle.id(), "Registering actor");
                entry.insert(handle);
                Ok(())
            }
        }
    }

    /// Removes an actor from the registry, returning its handle.
    pub fn deregister(&self, id: &str) -> Option<ActorHandle> {
        self.actors.remove(id).map(|(_, handle)| handle)
    }

    /// Returns the handle registered under `id`.
    pub fn get(&self, id: &str) -> Option<ActorHandle> {
        self.actors.get(id).map(|entry| entry.value().clone())
    }

    /// Returns the registered actor ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.actors.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Returns the number of registered actors.
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Returns `true` if no actor is registered.
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Routes a message, logging rather than returning any delivery failure.
    pub async fn dispatch(&self, message: Message) {
        if let Err(e) = self.try_dispatch(message).await {
            warn!("Dropping undeliverable message: {e}");
        }
    }

    /// Routes a message and reports how many actors it reached.
    ///
    /// A broadcast skips actors whose inbox has closed; those are logged at `debug` level.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownReceiver`] or [`DispatchError::Closed`] when an
    /// addressed message cannot be delivered.
    #[instrument(skip(self, message), fields(sender = %message.sender(), message_type = %message.message_type()))]
    pub async fn try_dispatch(&self, message: Message) -> Result<usize, DispatchError> {
        let addressed = message.receiver().map(str::to_owned);
        let recipients: Vec<ActorHandle> = self
            .actors
            .iter()
            .filter(|entry| message.is_for(entry.key()))
            .filter(|entry| addressed.is_some() || entry.key() != message.sender())
            .map(|entry| entry.value().clone())
            .collect();

        if let Some(receiver) = addressed {
            let handle = recipients
                .into_iter()
                .next()
                .ok_or(DispatchError::UnknownReceiver(receiver))?;
            handle.send(message).await?;
            return Ok(1);
        }

        trace!(recipients = recipients.len(), "Broadcasting message");

        let results = join_all(
            recipients
                .iter()
                .map(|handle| handle.send(message.clone())),
        )
        .await;

        let mut delivered = 0;
        for result in results {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => debug!("Broadcast skipped an actor: {e}"),
            }
        }
        Ok(delivered)
    }

    /// Resets every registered actor, starting a new run.
    ///
    /// Actors that have already stopped are skipped and logged.
    pub async fn reset_all(&self) {
        let handles = self.handles();
        for result in join_all(handles.iter().map(|handle| handle.reset())).await {
            if let Err(e) = result {
                warn!("Reset skipped an actor: {e}");
            }
        }
    }

    /// Stops every registered actor and waits for them to finish.
    ///
    /// # Errors
    ///
    /// Returns an error naming the actors that did not stop within the shutdown timeout.
    #[instrument(skip(self))]
    pub async fn stop_all(&self) -> anyhow::Result<()> {
        let handles = self.handles();
        let results = join_all(handles.iter().map(|handle| handle.stop())).await;
        let failed: Vec<&str> = handles
            .iter()
            .zip(results)
            .filter_map(|(handle, result)| result.err().map(|_| handle.id()))
            .collect();
        if failed.is_empty() {
            trace!("All actors stopped");
            Ok(())
        } else {
            Err(anyhow!("actors did not stop in time: {}", failed.join(", ")))
        }
    }

    fn handles(&self) -> Vec<ActorHandle> {
        self.actors
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
