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

use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::error;

use crate::actor::ActorConfig;
use crate::message::Message;

/// The lifecycle contract every pipeline participant implements.
///
/// A [`ManagedActor`](crate::actor::ManagedActor) owns the implementor on a dedicated task and
/// calls these hooks one at a time, so implementations never see concurrent calls and need
/// no locking for their own state.
///
/// * [`reset`](Self::reset) is the only place run state is initialized. It runs before the
///   first run and before every later one.
/// * [`on_receive`](Self::on_receive) is invoked for every message routed to the actor.
///   Returning `Err` (or panicking) does not reach the dispatch surface: the runtime hands
///   the error to [`on_error`](Self::on_error) and stops delivering messages until the next
///   reset.
/// * [`on_stop`](Self::on_stop) is invoked once when the run is cancelled and must leave the
///   actor terminal. Calling it again must be harmless.
#[async_trait]
pub trait PipelineActor: Send + 'static {
    /// Identity, dependencies and inbox bound of this actor.
    fn config(&self) -> &ActorConfig;

    /// Stable identifier, unique within a run.
    fn id(&self) -> &str {
        self.config().id()
    }

    /// Upstream actors whose completion this actor waits on.
    fn dependencies(&self) -> &BTreeSet<String> {
        self.config().dependencies()
    }

    /// Reinitializes all private run state.
    fn reset(&mut self);

    /// Handles one delivered message.
    ///
    /// May await, e.g. on a bounded downstream buffer, but should not hold the actor for an
    /// unbounded time.
    ///
    /// # Errors
    ///
    /// Any error ends the actor's run in its terminal error state.
    async fn on_receive(&mut self, message: &Message) -> anyhow::Result<()>;

    /// Enters the terminal stopped state.
    async fn on_stop(&mut self);

    /// Converts a failure escaping `on_receive` into the actor's terminal error state.
    async fn on_error(&mut self, error: anyhow::Error) {
        error!(actor = %self.id(), "Unhandled error in message handler: {error:?}");
    }
}
