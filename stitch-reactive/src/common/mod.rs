//! Shared engines, collaborators and infrastructure.
//!
//! *   [`stitch`] / [`merge_values`]: the merge engine folding contributions into a document.
//! *   [`DeltaEngine`], [`EditScript`], [`delta`], [`apply`]: reversible text edit scripts.
//! *   [`HandlebarsRenderer`]: the default template renderer.
//! *   [`BookkeepingData`], [`ChannelSink`], [`NullSink`], [`BookkeepingFuture`]: audit
//!     records, sinks and the deferred per-run handle.
//! *   [`Coordinator`]: an in-process dispatch surface.
//! *   [`StitchConfig`] and the global [`CONFIG`].
//! *   [`init_tracing`]: subscriber setup.

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

pub use bookkeeping::{
    bookkeeping_pair, BookkeepingData, BookkeepingError, BookkeepingFuture, BookkeepingPromise,
    ChannelSink, NullSink,
};
pub use config::{
    ConfigError, DefaultsConfig, LimitsConfig, StitchConfig, TimeoutConfig, TracingConfig, CONFIG,
};
pub use coordinator::Coordinator;
pub use delta::{apply, delta, DeltaEngine, DeltaError, EditOp, EditScript};
pub use logging::init_tracing;
pub use stitcher::{merge_values, stitch, StitchError};
pub use template::{HandlebarsRenderer, TemplateError};

/// Audit records, sinks and deferred handles.
mod bookkeeping;
/// Configuration loading.
pub(crate) mod config;
/// The in-process dispatch surface.
mod coordinator;
/// Text edit scripts.
mod delta;
/// Tracing subscriber setup.
mod logging;
/// The merge engine.
mod stitcher;
/// Handlebars rendering.
mod template;
/// Crate-internal channel types.
pub(crate) mod types;
