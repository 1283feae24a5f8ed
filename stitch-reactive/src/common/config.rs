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

use std::path::Path;
use std::time::Duration;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

/// Configuration for the Stitch pipeline runtime.
///
/// Loaded from `stitch/config.toml` in the XDG config directories. Every section and every
/// field is optional; anything omitted takes its default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// Buffer and inbox bounds
    pub limits: LimitsConfig,
    /// Default identifiers
    pub defaults: DefaultsConfig,
    /// Tracing and logging configuration
    pub tracing: TracingConfig,
}

/// Timeout-related configuration values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long `ActorHandle::stop` waits for the processing task, in milliseconds
    pub actor_shutdown_ms: u64,
    /// Time budget for one text diff in milliseconds, `0` for no budget
    pub delta_deadline_ms: u64,
}

/// Buffer and inbox bounds.
///
/// `None` means unbounded. Bounded inboxes make producers wait for capacity; a bounded
/// output buffer makes the aggregator wait for the consumer. Ordering is preserved either way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Capacity of each actor's inbound channel
    pub actor_inbox_capacity: Option<usize>,
    /// Capacity of the output actor's fragment buffer
    pub output_buffer_capacity: Option<usize>,
}

/// Default identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Id given to the output actor
    pub output_actor_id: String,
    /// Key of the template rendered for the consumer
    pub output_template_key: String,
}

/// Tracing and logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Directory for log files; logs go to stderr when unset
    pub log_directory: Option<String>,
    /// Log file name inside `log_directory`
    pub log_file: String,
}

/// Errors raised when loading configuration from an explicit path.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration file: {0}")]
    Read(#[from] std::io::Error),
    /// The file is not valid configuration TOML.
    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            actor_shutdown_ms: 10_000,
            delta_deadline_ms: 500,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_actor_id: "output".to_string(),
            output_template_key: "output".to_string(),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_directory: None,
            log_file: "stitch.log".to_string(),
        }
    }
}

impl StitchConfig {
    /// Actor shutdown timeout as a `Duration`
    pub const fn actor_shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.actor_shutdown_ms)
    }

    /// Diff time budget, `None` when disabled
    pub const fn delta_deadline(&self) -> Option<Duration> {
        match self.timeouts.delta_deadline_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the text is malformed or has mistyped values.
    pub fn from_toml_str(config_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(config_str)
    }

    /// Loads configuration from an explicit file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&config_str)?)
    }

    /// Load configuration from XDG-compliant locations
    ///
    /// Looks for `stitch/config.toml` under `$XDG_CONFIG_HOME` (falling back to
    /// `~/.config`) and the XDG config dirs. A missing file yields the defaults; a file that
    /// cannot be read or parsed is logged and also yields the defaults.
    pub fn load() -> Self {
        let xdg_dirs = match xdg::BaseDirectories::with_prefix("stitch") {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to initialize XDG directories: {}", e);
                return Self::default();
            }
        };

        let Some(path) = xdg_dirs.find_config_file("config.toml") else {
            info!("No configuration file found, using defaults");
            return Self::default();
        };

        info!("Loading configuration from: {}", path.display());
        match Self::load_from(&path) {
            Ok(config) => {
                info!("Successfully loaded configuration");
                config
            }
            Err(e) => {
                error!("{} ({}), using defaults", e, path.display());
                Self::default()
            }
        }
    }
}

lazy_static! {
    /// Global configuration instance loaded from XDG-compliant locations
    pub static ref CONFIG: StitchConfig = StitchConfig::load();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_sections_keep_defaults() {
        let config = StitchConfig::from_toml_str(
            r#"
            [limits]
            output_buffer_capacity = 16

            [timeouts]
            delta_deadline_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.limits.output_buffer_capacity, Some(16));
        assert_eq!(config.limits.actor_inbox_capacity, None);
        assert_eq!(config.timeouts.actor_shutdown_ms, 10_000);
        assert_eq!(config.delta_deadline(), None);
        assert_eq!(config.defaults.output_actor_id, "output");
    }

    #[test]
    fn mistyped_values_are_rejected() {
        assert!(StitchConfig::from_toml_str("[timeouts]\nactor_shutdown_ms = \"soon\"").is_err());
    }

    #[test]
    fn defaults_are_unbounded() {
        let config = StitchConfig::default();
        assert_eq!(config.limits, LimitsConfig::default());
        assert_eq!(config.delta_deadline(), Some(Duration::from_millis(500)));
        assert_eq!(config.actor_shutdown_timeout(), Duration::from_secs(10));
    }
}
