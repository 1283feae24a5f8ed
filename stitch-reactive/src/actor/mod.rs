//! Creating, running and controlling pipeline actors.
//!
//! # Key Components
//!
//! *   [`ActorConfig`]: an actor's id, the upstream actors it depends on, and an optional
//!     inbox bound.
//! *   [`ManagedActor`]: runs one [`PipelineActor`](crate::traits::PipelineActor) on its
//!     own processing task, the single writer of that actor's state.
//! *   [`ActorHandle`]: the clonable handle used to send messages, reset and stop.
//! *   [`ActorState`]: `Fresh`, `Running` or `Stopped`.
//! *   [`OutputActor`]: the aggregator that produces the consumer-facing stream, with its
//!     [`OutputHandle`], [`OutputStream`] and [`OutputFragment`] types.

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

pub use actor_config::ActorConfig;
pub use actor_handle::ActorHandle;
pub use lifecycle::ActorState;
pub use managed_actor::ManagedActor;
pub use output_actor::{
    AggregatedDocument, AggregatorState, OutputActor, OutputError, OutputFragment, OutputHandle,
    OutputStream, OUTPUT_INTERRUPTED,
};

/// Contains the `ActorConfig` struct for actor initialization.
mod actor_config;

/// Contains the `ActorHandle` used to reach a running actor.
mod actor_handle;

/// Contains the shared lifecycle state.
mod lifecycle;

/// Contains the `ManagedActor` processing loop.
mod managed_actor;

/// Contains the output aggregator.
mod output_actor;
