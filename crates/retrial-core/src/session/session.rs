//! One retry campaign: identity, budget, last-attempt time, attempt count.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::backoff::{Admission, BackoffPolicy};
use crate::error::{Result, RetryError};

use super::id::SessionId;
use super::registry::SessionRegistry;

#[derive(Debug, Default)]
struct SessionState {
    last_attempt_at: Option<Instant>,
    closed: bool,
}

/// A retry session.
///
/// The attempt count lives in the registry's table; the last-attempt time
/// lives here behind the session lock. Admission and close both take the
/// session lock first and the table lock second.
///
/// Dropping a session closes it.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    max_retries: u32,
    policy: Arc<BackoffPolicy>,
    registry: Arc<SessionRegistry>,
    state: Mutex<SessionState>,
}

impl Session {
    pub(super) fn new(
        id: SessionId,
        max_retries: u32,
        policy: Arc<BackoffPolicy>,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            id,
            max_retries,
            policy,
            registry,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn policy(&self) -> &Arc<BackoffPolicy> {
        &self.policy
    }

    /// Attempts admitted so far, or `None` once closed.
    pub fn attempts(&self) -> Option<u32> {
        self.registry.attempts(&self.id)
    }

    /// Attempts left in the budget, or `None` once closed.
    pub fn remaining(&self) -> Option<u32> {
        self.attempts()
            .map(|used| self.max_retries.saturating_sub(used))
    }

    pub fn last_attempt_at(&self) -> Option<Instant> {
        self.lock_state().last_attempt_at
    }

    pub fn is_open(&self) -> bool {
        !self.lock_state().closed && self.attempts().is_some()
    }

    /// Ask whether the caller may attempt the operation now.
    ///
    /// - `Ok(true)`: admitted; the attempt is already counted.
    /// - `Ok(false)`: too soon; nothing changed, ask again later.
    /// - `Err(InvalidSession)`: the session was closed.
    /// - `Err(MaxRetryExceeded)`: budget exhausted; permanent.
    /// - `Err(RetryWindowAbsent)`: linear policy with a non-positive window.
    pub fn allow_retry(&self) -> Result<bool> {
        let mut state = self.lock_state();
        let now = self.registry.clock().now();
        let mut table = self.registry.table();

        let Some(count) = table.get_mut(&self.id) else {
            tracing::debug!(session = %self.id, "admission check on closed session");
            return Err(RetryError::InvalidSession);
        };

        if *count >= self.max_retries {
            tracing::warn!(
                session = %self.id,
                attempts = *count,
                max_retries = self.max_retries,
                "retry budget exhausted"
            );
            return Err(RetryError::MaxRetryExceeded);
        }

        let since_last = state
            .last_attempt_at
            .map(|at| now.saturating_duration_since(at));
        let admission = match self.policy.evaluate(since_last, *count) {
            Ok(admission) => admission,
            Err(err) => {
                tracing::warn!(
                    session = %self.id,
                    error = err.as_label(),
                    "retry policy unusable: {}",
                    err
                );
                return Err(err);
            }
        };

        match admission {
            Admission::Deny => {
                tracing::debug!(
                    session = %self.id,
                    attempts = *count,
                    elapsed = ?since_last,
                    "retry denied, too soon"
                );
                Ok(false)
            }
            Admission::Admit => {
                *count += 1;
                state.last_attempt_at = Some(now);
                tracing::debug!(
                    session = %self.id,
                    attempts = *count,
                    max_retries = self.max_retries,
                    "retry admitted"
                );
                Ok(true)
            }
        }
    }

    /// Remove this session from the attempt table.
    ///
    /// Closing an already closed session does nothing and still returns `Ok`.
    pub fn close(&self) -> Result<()> {
        let mut state = self.lock_state();
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        let attempts = self.registry.table().remove(&self.id);
        tracing::info!(session = %self.id, attempts = ?attempts, "retry session closed");
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
