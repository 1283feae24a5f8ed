//! Reversible edit scripts between two text snapshots.
//!
//! [`DeltaEngine::delta`] turns `(previous, next)` into an [`EditScript`] such that
//! `script.apply(previous) == next`. The script serializes to the compact diff-match-patch
//! delta text (`=3\t-2\t+abc`), with insert text percent-encoded and lengths counted in
//! Unicode scalar values.
//!
//! Computation never fails from the caller's point of view: any error, including a script
//! that does not reproduce `next` when applied, degrades to a replace-all script.

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

use std::fmt::{self, Write as _};
use std::str::FromStr;
use std::time::{Duration, Instant};

use derive_new::new;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use similar::{Algorithm, DiffOp, TextDiff};
use thiserror::Error;
use tracing::{trace, warn};

use crate::common::config::StitchConfig;

/// Errors raised while computing, parsing or applying an edit script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeltaError {
    /// A retain or delete ran past the end of the source text.
    #[error("edit at position {position} needs {requested} chars but only {available} remain")]
    OutOfBounds {
        /// Char offset in the source where the operation starts.
        position: usize,
        /// Chars the operation asked for.
        requested: usize,
        /// Chars left in the source.
        available: usize,
    },
    /// The script finished before consuming the whole source text.
    #[error("edit script left {remaining} chars of the source unconsumed")]
    UnconsumedInput {
        /// Chars never retained or deleted.
        remaining: usize,
    },
    /// A delta token did not start with `=`, `-` or `+`.
    #[error("invalid delta operation `{0}`")]
    InvalidOperation(String),
    /// A retain or delete count was not a number.
    #[error("invalid count in delta token `{0}`")]
    InvalidCount(String),
    /// Insert text contained a malformed percent escape or invalid UTF-8.
    #[error("invalid escape in insert text `{0}`")]
    InvalidEscape(String),
    /// The computed script did not reproduce the target text.
    #[error("edit script does not reproduce the target text")]
    Verification,
}

/// A single edit operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    /// Keep the next `n` chars of the source.
    Retain(usize),
    /// Drop the next `n` chars of the source.
    Delete(usize),
    /// Insert the given text.
    Insert(String),
}

/// An ordered list of [`EditOp`]s transforming one text into another.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditScript {
    ops: Vec<EditOp>,
}

impl EditScript {
    /// The degenerate script that deletes `previous` entirely and inserts `next`.
    #[must_use]
    pub fn replace_all(previous: &str, next: &str) -> Self {
        let mut script = Self::default();
        script.push(EditOp::Delete(previous.chars().count()));
        script.push(EditOp::Insert(next.to_owned()));
        script
    }

    /// The operations in application order.
    #[must_use]
    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    /// True when the script changes nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.ops.iter().all(|op| matches!(op, EditOp::Retain(_)))
    }

    /// Appends an operation, coalescing it with the previous one when both are the same kind.
    /// Zero-length operations are dropped.
    pub fn push(&mut self, op: EditOp) {
        match &op {
            EditOp::Retain(0) | EditOp::Delete(0) => return,
            EditOp::Insert(text) if text.is_empty() => return,
            _ => {}
        }
        if let Some(last) = self.ops.last_mut() {
            match (last, &op) {
                (EditOp::Retain(total), EditOp::Retain(n))
                | (EditOp::Delete(total), EditOp::Delete(n)) => {
                    *total += *n;
                    return;
                }
                (EditOp::Insert(total), EditOp::Insert(text)) => {
                    total.push_str(text);
                    return;
                }
                _ => {}
            }
        }
        self.ops.push(op);
    }

    /// Applies the script to `previous`.
    ///
    /// # Errors
    ///
    /// Returns [`DeltaError::OutOfBounds`] if the script reaches past the end of `previous`,
    /// or [`DeltaError::UnconsumedInput`] if it does not account for all of it.
    pub fn apply(&self, previous: &str) -> Result<String, DeltaError> {
        let source: Vec<char> = previous.chars().collect();
        let mut cursor = 0;
        let mut output = String::with_capacity(previous.len());
        for op in &self.ops {
            match op {
                EditOp::Retain(n) | EditOp::Delete(n) => {
                    let available = source.len() - cursor;
                    if *n > available {
                        return Err(DeltaError::OutOfBounds {
                            position: cursor,
                            requested: *n,
                            available,
                        });
                    }
                    if matches!(op, EditOp::Retain(_)) {
                        output.extend(&source[cursor..cursor + n]);
                    }
                    cursor += n;
                }
                EditOp::Insert(text) => output.push_str(text),
            }
        }
        if cursor != source.len() {
            return Err(DeltaError::UnconsumedInput {
                remaining: source.len() - cursor,
            });
        }
        Ok(output)
    }

    /// Renders the script as diff-match-patch delta text.
    #[must_use]
    pub fn to_delta(&self) -> String {
        let mut delta = String::new();
        for (index, op) in self.ops.iter().enumerate() {
            if index > 0 {
                delta.push('\t');
            }
            match op {
                EditOp::Retain(n) => {
                    let _ = write!(delta, "={n}");
                }
                EditOp::Delete(n) => {
                    let _ = write!(delta, "-{n}");
                }
                EditOp::Insert(text) => {
                    delta.push('+');
                    encode_insert(text, &mut delta);
                }
            }
        }
        delta
    }

    /// Parses diff-match-patch delta text.
    ///
    /// # Errors
    ///
    /// Returns a [`DeltaError`] describing the first malformed token.
    pub fn from_delta(delta: &str) -> Result<Self, DeltaError> {
        let mut script = Self::default();
        for token in delta.split('\t').filter(|token| !token.is_empty()) {
            let mut chars = token.chars();
            let op = chars.next();
            let rest = chars.as_str();
            match op {
                Some('+') => script.push(EditOp::Insert(decode_insert(rest)?)),
                Some(op @ ('=' | '-')) => {
                    let count: usize = rest
                        .parse()
                        .map_err(|_| DeltaError::InvalidCount(token.to_owned()))?;
                    let merged = match (script.ops.last(), op) {
                        (Some(EditOp::Retain(total)), '=') | (Some(EditOp::Delete(total)), '-') => {
                            total.checked_add(count)
                        }
                        _ => Some(count),
                    };
                    if merged.is_none() {
                        return Err(DeltaError::InvalidCount(token.to_owned()));
                    }
                    script.push(if op == '=' {
                        EditOp::Retain(count)
                    } else {
                        EditOp::Delete(count)
                    });
                }
                _ => return Err(DeltaError::InvalidOperation(token.to_owned())),
            }
        }
        Ok(script)
    }
}

impl fmt::Display for EditScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_delta())
    }
}

impl FromStr for EditScript {
    type Err = DeltaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_delta(s)
    }
}

impl Serialize for EditScript {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_delta())
    }
}

impl<'de> Deserialize<'de> for EditScript {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let delta = String::deserialize(deserializer)?;
        Self::from_delta(&delta).map_err(serde::de::Error::custom)
    }
}

/// Computes edit scripts, optionally bounding the time spent diffing.
#[derive(Debug, Clone, Copy, Default, new)]
pub struct DeltaEngine {
    /// Past this budget the diff falls back to a coarser, still exact, script.
    deadline: Option<Duration>,
}

impl DeltaEngine {
    /// Builds an engine using `timeouts.delta_deadline_ms` from `config`.
    #[must_use]
    pub fn from_config(config: &StitchConfig) -> Self {
        Self::new(config.delta_deadline())
    }

    /// Returns a script turning `previous` into `next`.
    ///
    /// Never fails: on any computation error a replace-all script is returned and a warning
    /// is logged.
    #[must_use]
    pub fn delta(&self, previous: &str, next: &str) -> EditScript {
        match self.try_delta(previous, next) {
            Ok(script) => script,
            Err(err) => {
                warn!("Delta computation failed, sending full replacement: {err}");
                EditScript::replace_all(previous, next)
            }
        }
    }

    /// Computes a script and verifies it reproduces `next`.
    ///
    /// # Errors
    ///
    /// Returns [`DeltaError::Verification`] if the computed script does not round-trip.
    pub fn try_delta(&self, previous: &str, next: &str) -> Result<EditScript, DeltaError> {
        let mut config = TextDiff::configure();
        config.algorithm(Algorithm::Myers);
        if let Some(budget) = self.deadline {
            config.deadline(Instant::now() + budget);
        }
        let diff = config.diff_chars(previous, next);
        let next_chars: Vec<char> = next.chars().collect();
        let inserted = |start: usize, len: usize| -> String {
            next_chars[start..start + len].iter().collect()
        };

        let mut script = EditScript::default();
        for op in diff.ops() {
            match op {
                DiffOp::Equal { len, .. } => script.push(EditOp::Retain(*len)),
                DiffOp::Delete { old_len, .. } => script.push(EditOp::Delete(*old_len)),
                DiffOp::Insert {
                    new_index, new_len, ..
                } => script.push(EditOp::Insert(inserted(*new_index, *new_len))),
                DiffOp::Replace {
                    old_len,
                    new_index,
                    new_len,
                    ..
                } => {
                    script.push(EditOp::Delete(*old_len));
                    script.push(EditOp::Insert(inserted(*new_index, *new_len)));
                }
            }
        }

        if script.apply(previous)? != next {
            return Err(DeltaError::Verification);
        }
        trace!(ops = script.ops().len(), "Computed edit script");
        Ok(script)
    }
}

/// Shorthand for [`DeltaEngine::delta`] without a deadline.
#[must_use]
pub fn delta(previous: &str, next: &str) -> EditScript {
    DeltaEngine::default().delta(previous, next)
}

/// Shorthand for [`EditScript::apply`].
///
/// # Errors
///
/// See [`EditScript::apply`].
pub fn apply(script: &EditScript, previous: &str) -> Result<String, DeltaError> {
    script.apply(previous)
}

// Matches the set of characters encodeURI leaves alone, plus space.
fn is_unreserved(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || " ;,/?:@&=+$-_.!~*'()#".contains(ch)
}

fn encode_insert(text: &str, out: &mut String) {
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        if is_unreserved(ch) {
            out.push(ch);
        } else {
            for byte in ch.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
}

fn decode_insert(text: &str) -> Result<String, DeltaError> {
    let invalid = || DeltaError::InvalidEscape(text.to_owned());
    let raw = text.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut index = 0;
    while index < raw.len() {
        if raw[index] == b'%' {
            let hex = text.get(index + 1..index + 3).ok_or_else(invalid)?;
            bytes.push(u8::from_str_radix(hex, 16).map_err(|_| invalid())?);
            index += 3;
        } else {
            bytes.push(raw[index]);
            index += 1;
        }
    }
    String::from_utf8(bytes).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIRS: &[(&str, &str)] = &[
        ("", ""),
        ("", "hello"),
        ("hello", ""),
        ("hello world", "hello brave new world"),
        ("The cat sat", "The hat sat on the mat"),
        ("a\tb\nc", "a\tB\nc%"),
        ("naïve café", "naive cafés ☕"),
        ("{\"x\": 1}", "{\"x\": 1, \"y\": [2]}"),
    ];

    #[test]
    fn delta_round_trips() {
        for (previous, next) in PAIRS {
            let script = delta(previous, next);
            assert_eq!(apply(&script, previous).unwrap(), *next, "{previous:?} -> {next:?}");
        }
    }

    #[test]
    fn delta_text_round_trips() {
        for (previous, next) in PAIRS {
            let text = delta(previous, next).to_delta();
            let parsed: EditScript = text.parse().unwrap();
            assert_eq!(parsed.apply(previous).unwrap(), *next);
        }
    }

    #[test]
    fn delta_text_uses_dmp_format() {
        assert_eq!(delta("abc", "abXc").to_delta(), "=2\t+X\t=1");
        assert_eq!(delta("abc", "ac").to_delta(), "=1\t-1\t=1");
        assert_eq!(delta("a", "a b%").to_delta(), "=1\t+ b%25");
    }

    #[test]
    fn unchanged_text_is_a_noop() {
        let script = delta("same", "same");
        assert!(script.is_noop());
        assert_eq!(script.to_delta(), "=4");
    }

    #[test]
    fn replace_all_applies() {
        let script = EditScript::replace_all("old text", "new");
        assert_eq!(script.to_delta(), "-8\t+new");
        assert_eq!(script.apply("old text").unwrap(), "new");
    }

    #[test]
    fn apply_rejects_scripts_for_other_sources() {
        let script = delta("abc", "abd");
        assert!(matches!(
            script.apply("a"),
            Err(DeltaError::OutOfBounds { .. })
        ));
        assert_eq!(
            EditScript::from_delta("=1").unwrap().apply("abc"),
            Err(DeltaError::UnconsumedInput { remaining: 2 })
        );
    }

    #[test]
    fn malformed_delta_text_is_rejected() {
        assert!(matches!(
            EditScript::from_delta("*3"),
            Err(DeltaError::InvalidOperation(_))
        ));
        assert!(matches!(
            EditScript::from_delta("=x"),
            Err(DeltaError::InvalidCount(_))
        ));
        assert!(matches!(
            EditScript::from_delta("+%G1"),
            Err(DeltaError::InvalidEscape(_))
        ));
    }

    #[test]
    fn overflowing_counts_are_rejected() {
        let max = usize::MAX;
        assert!(matches!(
            EditScript::from_delta(&format!("={max}\t=1")),
            Err(DeltaError::InvalidCount(token)) if token == "=1"
        ));
        assert!(matches!(
            EditScript::from_delta(&format!("-{max}\t-5")),
            Err(DeltaError::InvalidCount(_))
        ));
        let script = EditScript::from_delta(&format!("={max}\t-1")).unwrap();
        assert_eq!(script.ops().len(), 2);
        let fragment = serde_json::from_value::<crate::actor::OutputFragment>(serde_json::json!({
            "deltas": {"output": format!("-{max}\t-5")},
            "chunk": {}
        }));
        assert!(fragment.is_err());
    }

    #[test]
    fn scripts_serialize_as_delta_strings() {
        let script = delta("ab", "abc");
        let json = serde_json::to_value(&script).unwrap();
        assert_eq!(json, serde_json::json!("=2\t+c"));
        let back: EditScript = serde_json::from_value(json).unwrap();
        assert_eq!(back, script);
    }

    #[test]
    fn deadline_still_produces_exact_script() {
        let previous = "lorem ipsum ".repeat(200);
        let next = "ipsum lorem ".repeat(200);
        let script = DeltaEngine::new(Some(Duration::ZERO)).delta(&previous, &next);
        assert_eq!(script.apply(&previous).unwrap(), next);
    }
}
