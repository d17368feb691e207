//! Backoff flags shared by the `run` and `schedule` subcommands.

use anyhow::{Context, Result};
use clap::Args;
use retrial_core::config::RetrialConfig;
use retrial_core::{BackoffPolicy, RetryError, StrategyKind};

fn parse_strategy(s: &str) -> Result<StrategyKind, RetryError> {
    s.parse()
}

/// Strategy, parameter and budget. Each flag falls back to the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct PolicyArgs {
    /// Backoff strategy: 0 = linear, 1 = exponential (names are accepted too).
    #[arg(long, value_name = "0|1", value_parser = parse_strategy)]
    pub strategy: Option<StrategyKind>,

    /// Window in seconds (linear) or exponent base (exponential).
    #[arg(long, value_name = "VALUE", allow_negative_numbers = true)]
    pub param: Option<f64>,

    /// Maximum number of attempts.
    #[arg(long = "max-retries", value_name = "N")]
    pub max_retries: Option<u32>,
}

impl PolicyArgs {
    /// Merge flags over config values and build the policy and budget.
    pub fn resolve(&self, cfg: &RetrialConfig) -> Result<(BackoffPolicy, u32)> {
        let kind = self.strategy.unwrap_or(cfg.strategy);
        let param = self.param.unwrap_or(cfg.param);
        let max_retries = self.max_retries.unwrap_or(cfg.max_retries);
        let policy = BackoffPolicy::from_kind(kind, param)
            .with_context(|| format!("invalid {kind} parameter {param}"))?;
        Ok((policy, max_retries))
    }
}
