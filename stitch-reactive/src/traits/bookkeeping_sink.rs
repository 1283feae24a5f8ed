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

use std::fmt::Debug;

use tracing::warn;

use crate::common::{BookkeepingData, BookkeepingError};

/// An append-only, externally consumed channel for audit records.
///
/// A single sink is shared by every actor of a pipeline, so implementations must accept
/// concurrent appends and must never block the caller on the consumer.
pub trait BookkeepingSink: Send + Sync + Debug {
    /// Appends one record.
    ///
    /// # Errors
    ///
    /// Returns a [`BookkeepingError`] when the record could not be handed off.
    fn append(&self, record: BookkeepingData) -> Result<(), BookkeepingError>;

    /// Fire-and-forget append. Failures are logged and dropped.
    fn bookkeep(&self, record: BookkeepingData) {
        let actor_id = record.actor_id.clone();
        if let Err(e) = self.append(record) {
            warn!(actor = %actor_id, "Dropping bookkeeping record: {e}");
        }
    }
}
