//! Seams between the pipeline core and its collaborators.
//!
//! * [`PipelineActor`]: the lifecycle contract every actor implements.
//! * [`BookkeepingSink`]: the shared, append-only audit channel.
//! * [`Renderer`]: the templating function applied to the aggregated document.

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

pub use bookkeeping_sink::BookkeepingSink;
pub use pipeline_actor::PipelineActor;
pub use renderer::Renderer;

mod bookkeeping_sink;
mod pipeline_actor;
mod renderer;
