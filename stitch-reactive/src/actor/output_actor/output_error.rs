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

use thiserror::Error;
use uuid::Uuid;

use crate::message::DispatchError;

/// Errors returned by [`OutputHandle`](crate::actor::OutputHandle).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
    /// The run's output stream was already handed out.
    #[error("output stream for run {0} was already taken")]
    StreamTaken(Uuid),
    /// The run's bookkeeping handle was already handed out.
    #[error("bookkeeping data for run {0} was already taken")]
    BookkeepingTaken(Uuid),
    /// The output actor could not be reached.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    /// The output actor stopped before acknowledging a reset.
    #[error("output actor `{0}` stopped before the next run began")]
    Stopped(String),
}
