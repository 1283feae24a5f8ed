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

#![forbid(unsafe_code)]
#![forbid(missing_docs)]

//! # Stitch Reactive
//!
//! An actor messaging substrate for streaming pipelines, built on Tokio. Upstream actors
//! stream partial contributions; a terminal output actor stitches them into one document,
//! renders it, and streams compact text edits to a consumer until the run completes, fails
//! or is stopped.
//!
//! ## Key Concepts
//!
//! - **Messages (`Message`)**: immutable envelopes whose payload is validated against their
//!   `MessageType` at construction.
//! - **Actors (`PipelineActor`, `ManagedActor`)**: each actor runs on its own task and is
//!   the only writer of its state; `reset`, `on_receive` and `on_stop` form its lifecycle.
//! - **Handles (`ActorHandle`)**: send messages, reset between runs, stop.
//! - **Merge engine (`stitch`)**: recursive map union, replace for lists and scalars.
//! - **Delta engine (`EditScript`)**: reversible text edit scripts in delta text form.
//! - **Output aggregator (`OutputActor`)**: merges, renders and streams
//!   `OutputFragment`s; bookkeeping snapshots go to a `BookkeepingSink`.
//! - **Coordinator**: an in-process dispatch surface routing by receiver or broadcast.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use serde_json::json;
//! use stitch_reactive::prelude::*;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let output = OutputActor::with_dependencies(["llm"])?
//!     .with_template("output", "{{llm.text}}")
//!     .start();
//! let coordinator = Coordinator::new();
//! coordinator.register(output.actor().clone())?;
//!
//! let mut stream = output.get_output()?;
//! coordinator.dispatch(Message::chunk("llm", json!({"text": "hel"}))?).await;
//! coordinator.dispatch(Message::chunk("llm", json!({"text": "hello"}))?).await;
//! coordinator.dispatch(Message::content("llm", json!("hello"))?).await;
//! while let Some(fragment) = stream.next().await {
//!     println!("{}", fragment.to_json());
//! }
//! # Ok(())
//! # }
//! ```

/// Shared engines, collaborators and infrastructure.
pub(crate) mod common;

/// Actor configuration, runtime and the output aggregator.
pub(crate) mod actor;

/// The message envelope and its payloads.
pub(crate) mod message;

/// Seams implemented by actors and collaborators.
pub(crate) mod traits;

/// A prelude module for conveniently importing the most commonly used items.
pub mod prelude {
    // External crate re-exports
    pub use async_trait::async_trait;

    // Core types
    pub use crate::actor::{
        ActorConfig, ActorHandle, ActorState, AggregatedDocument, AggregatorState, ManagedActor,
        OutputActor, OutputError, OutputFragment, OutputHandle, OutputStream, OUTPUT_INTERRUPTED,
    };
    pub use crate::common::{
        apply, bookkeeping_pair, delta, init_tracing, merge_values, stitch, BookkeepingData,
        BookkeepingError, BookkeepingFuture, BookkeepingPromise, ChannelSink, ConfigError,
        Coordinator, DefaultsConfig, DeltaEngine, DeltaError, EditOp, EditScript,
        HandlebarsRenderer, LimitsConfig, NullSink, StitchConfig, StitchError, TemplateError,
        TimeoutConfig, TracingConfig, CONFIG,
    };
    pub use crate::message::{
        ContentData, ContentStreamChunkData, DispatchError, ErrorDetail, ErrorsData, Message,
        MessageBuilder, MessageError, MessageType, Payload, DEFAULT_ERROR_CODE,
    };
    pub use crate::traits::{BookkeepingSink, PipelineActor, Renderer};
}
