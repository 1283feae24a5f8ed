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

use anyhow::bail;

/// Configuration parameters required to create a new pipeline actor.
///
/// Encapsulates the actor's identifier, the set of upstream actors it depends on, and an
/// optional inbox bound. Identity is fixed at construction; the dependency set can be grown
/// with the builder methods before the actor starts.
///
/// # Inbox Capacity
///
/// By default actors use the inbox capacity from the global configuration
/// (`limits.actor_inbox_capacity`, unbounded when unset). Actors fed by very fast producers
/// can set a bound with [`with_inbox_capacity`](Self::with_inbox_capacity), in which case
/// senders await free capacity.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ActorConfig {
    id: String,
    dependencies: BTreeSet<String>,
    inbox_capacity: Option<usize>,
}

impl ActorConfig {
    /// Creates a new `ActorConfig` with no dependencies.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is empty or whitespace.
    pub fn new(id: impl Into<String>) -> anyhow::Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            bail!("actor id must not be empty");
        }
        Ok(Self {
            id,
            dependencies: BTreeSet::new(),
            inbox_capacity: None,
        })
    }

    /// Adds upstream dependencies. Duplicates collapse.
    ///
    /// # Errors
    ///
    /// Returns an error if any dependency id is empty, or if the actor names itself.
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for dependency in dependencies {
            let dependency = dependency.into();
            if dependency.trim().is_empty() {
                bail!("actor `{}` declares an empty dependency id", self.id);
            }
            if dependency == self.id {
                bail!("actor `{}` cannot depend on itself", self.id);
            }
            self.dependencies.insert(dependency);
        }
        Ok(self)
    }

    /// Sets a custom inbox capacity for this actor.
    #[must_use]
    pub const fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox_capacity = Some(capacity);
        self
    }

    /// Returns the actor's identifier.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the set of upstream actor ids.
    #[inline]
    pub const fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }

    /// Returns the custom inbox capacity, if set.
    #[inline]
    pub const fn inbox_capacity(&self) -> Option<usize> {
        self.inbox_capacity
    }
}
