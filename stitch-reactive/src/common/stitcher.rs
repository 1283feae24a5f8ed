//! Merges partial contributions into the accumulated output document.
//!
//! Merge rules, applied recursively:
//!
//! * map into map: key-by-key union, recursing into keys present on both sides;
//! * anything else (scalars, lists, or a shape change): the incoming value replaces the
//!   existing one. Lists are never appended element-wise.
//!
//! Same-key scalar writes are therefore last-write-wins in application order.

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

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors produced while stitching a contribution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StitchError {
    /// A spread sender contributed something other than a map, so it has no top-level keys
    /// to merge.
    #[error("spread contribution from `{sender}` must be a map, found {found}")]
    SpreadRequiresMap {
        /// The contributing sender.
        sender: String,
        /// JSON kind of the rejected contribution.
        found: &'static str,
    },
}

/// Returns `accumulated` with `contribution` from `sender` merged in.
///
/// When `spread` is false the contribution is merged under `accumulated[sender]`; when true
/// its own top-level keys are merged directly into `accumulated`. The input document is left
/// untouched, so a failed merge leaves the caller's last good state intact.
///
/// # Errors
///
/// Returns [`StitchError::SpreadRequiresMap`] when `spread` is set and the contribution is
/// not a map.
pub fn stitch(
    accumulated: &Map<String, Value>,
    sender: &str,
    contribution: &Value,
    spread: bool,
) -> Result<Map<String, Value>, StitchError> {
    let mut stitched = accumulated.clone();
    if spread {
        let Value::Object(entries) = contribution else {
            return Err(StitchError::SpreadRequiresMap {
                sender: sender.to_owned(),
                found: value_kind(contribution),
            });
        };
        for (key, value) in entries {
            merge_entry(&mut stitched, key, value);
        }
    } else {
        merge_entry(&mut stitched, sender, contribution);
    }
    Ok(stitched)
}

/// Deep-merges `incoming` into `base` in place.
pub fn merge_values(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(incoming_map)) => {
            for (key, value) in incoming_map {
                merge_entry(base_map, key, value);
            }
        }
        (base, incoming) => *base = incoming.clone(),
    }
}

fn merge_entry(target: &mut Map<String, Value>, key: &str, incoming: &Value) {
    match target.get_mut(key) {
        Some(existing) => merge_values(existing, incoming),
        None => {
            target.insert(key.to_owned(), incoming.clone());
        }
    }
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}
