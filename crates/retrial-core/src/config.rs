use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backoff::{BackoffPolicy, StrategyKind};

/// Defaults for the reference CLI, loaded from `~/.config/retrial/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrialConfig {
    /// Backoff strategy: "linear" or "exponential".
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Window in seconds (linear) or exponent base (exponential).
    #[serde(default = "default_param")]
    pub param: f64,
    /// Maximum number of admitted attempts per session.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// How long the CLI sleeps after a denied admission check, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_param() -> f64 {
    2.0
}

fn default_max_retries() -> u32 {
    5
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for RetrialConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Linear,
            param: default_param(),
            max_retries: default_max_retries(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl RetrialConfig {
    /// Backoff policy described by `strategy` and `param`.
    pub fn policy(&self) -> crate::error::Result<BackoffPolicy> {
        BackoffPolicy::from_kind(self.strategy, self.param)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("retrial")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RetrialConfig> {
    load_or_init_at(&config_path()?)
}

/// Same as [`load_or_init`] for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<RetrialConfig> {
    if !path.exists() {
        let default_cfg = RetrialConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)
            .with_context(|| format!("failed to write default config {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: RetrialConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
