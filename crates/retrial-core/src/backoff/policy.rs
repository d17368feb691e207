use std::time::Duration;

use crate::error::{Result, RetryError};

use super::StrategyKind;

/// Outcome of evaluating a policy for one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Enough time has passed; the attempt may go ahead.
    Admit,
    /// Too soon since the last attempt.
    Deny,
}

/// Backoff strategy with its single numeric parameter.
///
/// Policies are shared between the caller and any number of sessions
/// (`Arc<BackoffPolicy>`); evaluation is a pure function of the policy, the
/// time since the last attempt and the attempt count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffPolicy {
    /// Wait more than `base^attempts` seconds between attempts.
    Exponential { base: f64 },
    /// Wait more than `window_secs` seconds between attempts.
    Linear { window_secs: f64 },
}

impl BackoffPolicy {
    /// Exponential backoff with the given base.
    ///
    /// A base in `(0, 1)` is accepted and yields a shrinking window. A base
    /// that is not finite or is `<= 0` is rejected.
    pub fn exponential(base: f64) -> Result<Self> {
        validate_base(base)?;
        Ok(BackoffPolicy::Exponential { base })
    }

    /// Linear backoff with a fixed window in seconds.
    ///
    /// The window is not checked here: a non-positive window makes every
    /// admission check fail with [`RetryError::RetryWindowAbsent`].
    pub fn linear(window_secs: f64) -> Self {
        BackoffPolicy::Linear { window_secs }
    }

    /// Build a policy from a kind tag and its parameter.
    pub fn from_kind(kind: StrategyKind, param: f64) -> Result<Self> {
        match kind {
            StrategyKind::Exponential => Self::exponential(param),
            StrategyKind::Linear => Ok(Self::linear(param)),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            BackoffPolicy::Exponential { .. } => StrategyKind::Exponential,
            BackoffPolicy::Linear { .. } => StrategyKind::Linear,
        }
    }

    /// The exponent base or the window, depending on the kind.
    pub fn param(&self) -> f64 {
        match *self {
            BackoffPolicy::Exponential { base } => base,
            BackoffPolicy::Linear { window_secs } => window_secs,
        }
    }

    /// Replace the numeric parameter, applying the same validation as construction.
    pub fn set_param(&mut self, value: f64) -> Result<()> {
        match self {
            BackoffPolicy::Exponential { base } => {
                validate_base(value)?;
                *base = value;
            }
            BackoffPolicy::Linear { window_secs } => *window_secs = value,
        }
        Ok(())
    }

    /// Minimum spacing, in seconds, that must be exceeded before the next
    /// attempt when `attempts` attempts have already been admitted.
    ///
    /// For exponential backoff this is `base^attempts`.
    fn threshold_secs(&self, attempts: u32) -> Result<f64> {
        match *self {
            BackoffPolicy::Exponential { base } => Ok(base.powf(f64::from(attempts))),
            BackoffPolicy::Linear { window_secs } => {
                // `!(x > 0)` also catches NaN.
                if !(window_secs > 0.0) {
                    return Err(RetryError::RetryWindowAbsent);
                }
                Ok(window_secs)
            }
        }
    }

    /// Required wait after the last attempt, given the current attempt count.
    ///
    /// Saturates at [`Duration::MAX`] when the threshold overflows.
    pub fn required_wait(&self, attempts: u32) -> Result<Duration> {
        let secs = self.threshold_secs(attempts)?;
        Ok(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
    }

    /// Decide whether another attempt is allowed.
    ///
    /// `since_last` is `None` when no attempt has been admitted yet; the first
    /// attempt is always free (as long as the policy is usable). An elapsed
    /// time equal to the threshold is still too soon.
    pub fn evaluate(&self, since_last: Option<Duration>, attempts: u32) -> Result<Admission> {
        let threshold = self.threshold_secs(attempts)?;
        match since_last {
            Some(elapsed) if elapsed.as_secs_f64() <= threshold => Ok(Admission::Deny),
            _ => Ok(Admission::Admit),
        }
    }
}

fn validate_base(base: f64) -> Result<()> {
    if !base.is_finite() || base <= 0.0 {
        return Err(RetryError::BadRequest(format!(
            "exponential base must be a finite number greater than 0, got {base}"
        )));
    }
    Ok(())
}
