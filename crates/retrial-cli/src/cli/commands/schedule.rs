//! `retrial schedule` – show the wait required before each attempt.

use anyhow::{bail, Result};
use retrial_core::config::RetrialConfig;
use retrial_core::BackoffPolicy;
use std::time::Duration;

use crate::cli::PolicyArgs;

/// Longest schedule the command will print.
pub const MAX_SCHEDULE_ATTEMPTS: u32 = 1024;

/// Required wait before attempt `n`, for `n` in `1..=attempts`.
/// The first attempt never waits.
pub fn schedule(policy: &BackoffPolicy, attempts: u32) -> Result<Vec<(u32, Duration)>> {
    if attempts > MAX_SCHEDULE_ATTEMPTS {
        bail!("at most {MAX_SCHEDULE_ATTEMPTS} attempts can be scheduled, got {attempts}");
    }
    // Surface a missing window even though the first attempt is free.
    policy.required_wait(0)?;
    let mut rows = Vec::with_capacity(attempts as usize);
    for n in 1..=attempts {
        let wait = if n == 1 {
            Duration::ZERO
        } else {
            policy.required_wait(n - 1)?
        };
        rows.push((n, wait));
    }
    Ok(rows)
}

pub fn run_schedule(cfg: &RetrialConfig, args: &PolicyArgs, attempts: Option<u32>) -> Result<()> {
    let (policy, max_retries) = args.resolve(cfg)?;
    let rows = schedule(&policy, attempts.unwrap_or(max_retries))?;
    println!("{} backoff, param {}", policy.kind(), policy.param());
    println!("{:>8}  {:>14}", "ATTEMPT", "WAIT(s)");
    for (attempt, wait) in rows {
        println!("{:>8}  {:>14.3}", attempt, wait.as_secs_f64());
    }
    Ok(())
}
