//! Process-scoped attempt table shared by all sessions of a registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::backoff::BackoffPolicy;
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, RetryError};

use super::id::{SessionId, SessionIdSource};
use super::Session;

static GLOBAL: OnceLock<Arc<SessionRegistry>> = OnceLock::new();

/// Owner of the attempt table: session id -> attempts admitted so far.
///
/// Every read and write of the table goes through one mutex, so admission
/// checks on different sessions (or the same session from several threads)
/// never race on the read-check-increment.
#[derive(Debug)]
pub struct SessionRegistry {
    attempts: Mutex<HashMap<SessionId, u32>>,
    ids: SessionIdSource,
    clock: Arc<dyn Clock>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Registry reading time from `clock` (tests pass a `ManualClock`).
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            ids: SessionIdSource::default(),
            clock,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_id_source(clock: Arc<dyn Clock>, ids: SessionIdSource) -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            ids,
            clock,
        }
    }

    /// Process-wide registry, created on first use.
    pub fn global() -> Arc<SessionRegistry> {
        Arc::clone(GLOBAL.get_or_init(|| {
            tracing::debug!("initializing global retry session registry");
            Arc::new(SessionRegistry::new())
        }))
    }

    /// Open a new session with a zero attempt count.
    ///
    /// `max_retries` must be at least 1.
    pub fn create_session(
        self: &Arc<Self>,
        policy: Arc<BackoffPolicy>,
        max_retries: u32,
    ) -> Result<Session> {
        if max_retries == 0 {
            return Err(RetryError::BadRequest(
                "max_retries must be at least 1".to_string(),
            ));
        }
        let id = self.ids.next_id()?;
        self.table().insert(id.clone(), 0);
        tracing::info!(
            session = %id,
            strategy = %policy.kind(),
            param = policy.param(),
            max_retries,
            "retry session created"
        );
        Ok(Session::new(id, max_retries, policy, Arc::clone(self)))
    }

    /// Number of open sessions.
    pub fn live_sessions(&self) -> usize {
        self.table().len()
    }

    /// Attempts admitted so far for `id`, or `None` if it is not open.
    pub fn attempts(&self, id: &SessionId) -> Option<u32> {
        self.table().get(id).copied()
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Lock the attempt table. The table holds plain counters, so a panic
    /// while it was held cannot leave it half-updated.
    pub(crate) fn table(&self) -> MutexGuard<'_, HashMap<SessionId, u32>> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
