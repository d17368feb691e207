//! `retrial run [-- COMMAND...]` – retry an operation under a backoff budget.

use anyhow::{bail, Context, Result};
use retrial_core::config::RetrialConfig;
use retrial_core::{BackoffPolicy, RetryError, SessionRegistry};
use std::sync::Arc;
use std::time::Duration;

use crate::cli::PolicyArgs;

/// The fallible operation retried by the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Built-in operation that fails every time.
    AlwaysFail,
    /// External program; succeeds when it exits with status 0.
    Command(Vec<String>),
}

impl Operation {
    pub fn from_argv(argv: Vec<String>) -> Self {
        if argv.is_empty() {
            Operation::AlwaysFail
        } else {
            Operation::Command(argv)
        }
    }

    async fn attempt(&self) -> Result<()> {
        match self {
            Operation::AlwaysFail => {
                tracing::info!("running built-in operation");
                bail!("built-in operation failed")
            }
            Operation::Command(argv) => {
                let Some((program, args)) = argv.split_first() else {
                    bail!("empty command");
                };
                let status = tokio::process::Command::new(program)
                    .args(args)
                    .status()
                    .await
                    .with_context(|| format!("failed to start {program}"))?;
                if !status.success() {
                    bail!("{program} exited with {status}");
                }
                Ok(())
            }
        }
    }
}

/// How the retry loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded { attempts: u32 },
    Exhausted { attempts: u32 },
}

/// Ask the session for admission until the operation succeeds or the budget
/// is spent. Denied checks sleep for `poll` before asking again.
pub async fn retry_loop(
    registry: &Arc<SessionRegistry>,
    policy: BackoffPolicy,
    max_retries: u32,
    poll: Duration,
    op: &Operation,
) -> Result<RunOutcome> {
    let session = registry.create_session(Arc::new(policy), max_retries)?;

    let outcome = loop {
        match session.allow_retry() {
            Ok(true) => {
                let attempt = session.attempts().unwrap_or_default();
                match op.attempt().await {
                    Ok(()) => {
                        tracing::info!(attempt, "operation succeeded");
                        break RunOutcome::Succeeded { attempts: attempt };
                    }
                    Err(err) => tracing::warn!(attempt, "operation failed: {:#}", err),
                }
            }
            Ok(false) => tokio::time::sleep(poll).await,
            Err(RetryError::MaxRetryExceeded) => {
                tracing::info!("max retries exceeded");
                break RunOutcome::Exhausted {
                    attempts: session.attempts().unwrap_or(max_retries),
                };
            }
            Err(err) if err.is_terminal() => {
                tracing::error!(error = err.as_label(), "retry loop aborted: {}", err);
                return Err(err.into());
            }
            Err(err) => {
                tracing::warn!(error = err.as_label(), "admission check failed: {}", err);
                tokio::time::sleep(poll).await;
            }
        }
    };

    session.close()?;
    Ok(outcome)
}

pub async fn run_retry(
    cfg: &RetrialConfig,
    args: &PolicyArgs,
    poll_ms: Option<u64>,
    command: Vec<String>,
) -> Result<()> {
    let (policy, max_retries) = args.resolve(cfg)?;
    let poll = poll_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| cfg.poll_interval());
    tracing::info!(
        strategy = %policy.kind(),
        param = policy.param(),
        max_retries,
        "starting retry loop"
    );

    let op = Operation::from_argv(command);
    match retry_loop(&SessionRegistry::global(), policy, max_retries, poll, &op).await? {
        RunOutcome::Succeeded { attempts } => {
            println!("Succeeded after {attempts} attempt(s).");
            Ok(())
        }
        RunOutcome::Exhausted { attempts } => {
            bail!("max retries exceeded after {attempts} attempt(s)")
        }
    }
}
