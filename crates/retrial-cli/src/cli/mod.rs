//! CLI for the retrial retry-admission controller.

mod args;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use retrial_core::config;

pub use args::PolicyArgs;
use commands::{run_retry, run_schedule};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "retrial")]
#[command(about = "Retry an operation under a linear or exponential backoff budget", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Retry a command until it succeeds or the retry budget runs out.
    Run {
        #[command(flatten)]
        policy: PolicyArgs,

        /// Milliseconds to wait after a denied admission check.
        #[arg(long = "poll-ms", value_name = "MS")]
        poll_ms: Option<u64>,

        /// Command to run on each admitted attempt. Without one, a built-in
        /// operation that always fails is used.
        #[arg(last = true, value_name = "COMMAND")]
        command: Vec<String>,
    },

    /// Print the required wait before each attempt.
    Schedule {
        #[command(flatten)]
        policy: PolicyArgs,

        /// Number of attempts to show (defaults to the max retries).
        #[arg(long, value_name = "N")]
        attempts: Option<u32>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run {
                policy,
                poll_ms,
                command,
            } => run_retry(&cfg, &policy, poll_ms, command).await?,
            CliCommand::Schedule { policy, attempts } => run_schedule(&cfg, &policy, attempts)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
