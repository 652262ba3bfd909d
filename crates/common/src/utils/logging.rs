//! Subscriber setup shared by the Capsule services

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Output layout of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(anyhow::anyhow!("Unknown log format: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    /// Extra filter directives such as `capsule_faucet=debug`
    #[serde(default)]
    pub directives: Vec<String>,

    #[serde(default = "default_include_target")]
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            directives: Vec::new(),
            include_target: default_include_target(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_include_target() -> bool { true }

/// Install the global subscriber; fails if one is already set
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = build_env_filter(config, std::env::var("RUST_LOG").ok())?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.include_target);

    match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to install subscriber: {}", e))?;

    tracing::info!(
        "Logging initialized (level={}, format={:?})",
        config.level,
        config.format
    );
    Ok(())
}

/// Level, then configured directives, then `RUST_LOG` on top
fn build_env_filter(config: &LoggingConfig, rust_log: Option<String>) -> anyhow::Result<EnvFilter> {
    let mut parts = vec![config.level.clone()];
    parts.extend(config.directives.iter().cloned());
    if let Some(extra) = rust_log.filter(|s| !s.is_empty()) {
        parts.push(extra);
    }

    Ok(EnvFilter::try_new(parts.join(","))?)
}

/// Debug-level output captured by the test harness; repeat calls are no-ops
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .with_target(false)
        .try_init();
}
