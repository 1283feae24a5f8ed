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

//! Testing support for Stitch Reactive.
//!
//! The [`stitch_test`](prelude::stitch_test) attribute turns an `async fn` into a test that
//! runs on a multi-threaded Tokio runtime, logs through a test-writer subscriber, runs inside
//! an `info` span named after the test, and fails instead of hanging once its timeout
//! elapses (10 seconds unless `timeout_ms` is given).
//!
//! ```rust,ignore
//! use stitch_test::prelude::*;
//!
//! #[stitch_test(timeout_ms = 500)]
//! async fn completes_quickly() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

use std::fmt::Debug;
use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a test-writer tracing subscriber once per process.
///
/// Honours `RUST_LOG`; defaults to `info`.
pub fn initialize_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .compact()
            .with_line_number(true)
            .without_time()
            .with_target(true)
            .try_init();
    });
}

/// What a `#[stitch_test]` body may return.
pub trait TestOutcome {
    /// Panics if the outcome is a failure.
    fn check(self);
}

impl TestOutcome for () {
    fn check(self) {}
}

impl<E: Debug> TestOutcome for Result<(), E> {
    fn check(self) {
        if let Err(e) = self {
            panic!("test returned an error: {e:?}");
        }
    }
}

/// Items used by the generated test code. Not part of the public API.
#[doc(hidden)]
pub mod __private {
    pub use tokio;
    pub use tracing;
}

/// Imports the test attribute.
pub mod prelude {
    pub use stitch_test_macro::stitch_test;
}
