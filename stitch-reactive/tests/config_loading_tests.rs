#![allow(dead_code)]

use std::io::Write;
use std::time::Duration;

use stitch_reactive::prelude::*;
use stitch_test::prelude::*;

mod setup;

/// A complete file overrides every default.
#[stitch_test]
async fn load_from_reads_every_section() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        r#"
[timeouts]
actor_shutdown_ms = 250
delta_deadline_ms = 0

[limits]
actor_inbox_capacity = 64
output_buffer_capacity = 8

[defaults]
output_actor_id = "renderer"
output_template_key = "page"

[tracing]
level = "debug"
log_directory = "/tmp/stitch"
log_file = "run.log"
"#
    )?;

    let config = StitchConfig::load_from(file.path())?;
    assert_eq!(config.actor_shutdown_timeout(), Duration::from_millis(250));
    assert_eq!(config.delta_deadline(), None);
    assert_eq!(config.limits.actor_inbox_capacity, Some(64));
    assert_eq!(config.limits.output_buffer_capacity, Some(8));
    assert_eq!(config.defaults.output_actor_id, "renderer");
    assert_eq!(config.defaults.output_template_key, "page");
    assert_eq!(config.tracing.level, "debug");
    assert_eq!(config.tracing.log_directory.as_deref(), Some("/tmp/stitch"));
    assert_eq!(config.tracing.log_file, "run.log");
    Ok(())
}

/// Explicit loading reports unreadable and malformed files instead of falling back.
#[stitch_test]
async fn load_from_reports_failures() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let missing = StitchConfig::load_from(dir.path().join("absent.toml"));
    assert!(matches!(missing, Err(ConfigError::Read(_))));

    let malformed = dir.path().join("malformed.toml");
    std::fs::write(&malformed, "[limits]\nactor_inbox_capacity = \"many\"\n")?;
    assert!(matches!(
        StitchConfig::load_from(&malformed),
        Err(ConfigError::Parse(_))
    ));
    Ok(())
}

/// The XDG lookup finds `stitch/config.toml` under `XDG_CONFIG_HOME`.
///
/// **Scenario:**
/// 1. Point `XDG_CONFIG_HOME` at a temporary directory holding `stitch/config.toml`.
/// 2. Call `StitchConfig::load()`.
///
/// **Verification:**
/// - The file's values are used and omitted sections keep their defaults.
#[stitch_test]
async fn load_uses_the_xdg_config_home() -> anyhow::Result<()> {
    let home = tempfile::tempdir()?;
    let stitch_dir = home.path().join("stitch");
    std::fs::create_dir_all(&stitch_dir)?;
    std::fs::write(
        stitch_dir.join("config.toml"),
        "[defaults]\noutput_actor_id = \"from-xdg\"\n",
    )?;
    std::env::set_var("XDG_CONFIG_HOME", home.path());

    let config = StitchConfig::load();
    assert_eq!(config.defaults.output_actor_id, "from-xdg");
    assert_eq!(config.defaults.output_template_key, "output");
    assert_eq!(config.timeouts, TimeoutConfig::default());
    Ok(())
}
