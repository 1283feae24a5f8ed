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

use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::common::config::TracingConfig;

static INSTALLED: OnceLock<(bool, Option<WorkerGuard>)> = OnceLock::new();

/// Installs the global `tracing` subscriber described by `config`.
///
/// `RUST_LOG` takes precedence over `config.level`. When `config.log_directory` is set, logs
/// go to `log_directory/log_file` through a non-blocking writer; otherwise to stderr.
///
/// Only the first call in a process has any effect; later calls return its result. Returns
/// `false` if a global subscriber was already installed by someone else.
pub fn init_tracing(config: &TracingConfig) -> bool {
    let (installed, _guard) = INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.level));
        let builder = FmtSubscriber::builder()
            .with_span_events(FmtSpan::NONE)
            .compact()
            .with_line_number(true)
            .with_target(true)
            .with_env_filter(filter);

        let (result, guard) = match &config.log_directory {
            Some(directory) => {
                let appender =
                    RollingFileAppender::new(Rotation::NEVER, directory, &config.log_file);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let subscriber = builder.with_ansi(false).with_writer(writer).finish();
                (tracing::subscriber::set_global_default(subscriber), Some(guard))
            }
            None => {
                let subscriber = builder.with_writer(std::io::stderr).finish();
                (tracing::subscriber::set_global_default(subscriber), None)
            }
        };
        (result.is_ok(), guard)
    });
    *installed
}
