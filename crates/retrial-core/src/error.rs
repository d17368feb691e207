//! Error type returned by policy construction, session creation and admission checks.

use thiserror::Error;

/// Errors produced by the retry-admission controller.
///
/// Every error is returned to the immediate caller; nothing is retried
/// internally. A denied admission is not an error: `allow_retry` returns
/// `Ok(false)` when the policy says "not yet".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryError {
    /// Input rejected during validation (non-positive budget, unusable parameter).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Attempt budget exhausted; the session will never admit again.
    #[error("max retry count exceeded")]
    MaxRetryExceeded,

    /// Linear strategy configured with a non-positive window.
    #[error("retry window absent for the strategy")]
    RetryWindowAbsent,

    /// Strategy kind not recognized.
    #[error("invalid retry strategy")]
    InvalidRetryStrategy,

    /// Session id is not present in the attempt table (closed or never created).
    #[error("invalid retry session")]
    InvalidSession,

    /// The registry ran out of session ids.
    #[error("session id space exhausted")]
    SessionIdsExhausted,
}

impl RetryError {
    /// Whether asking again can never succeed. Everything except id
    /// exhaustion, which is about creating sessions rather than using one.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RetryError::SessionIdsExhausted)
    }

    /// Short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RetryError::BadRequest(_) => "bad_request",
            RetryError::MaxRetryExceeded => "max_retry_exceeded",
            RetryError::RetryWindowAbsent => "retry_window_absent",
            RetryError::InvalidRetryStrategy => "invalid_retry_strategy",
            RetryError::InvalidSession => "invalid_session",
            RetryError::SessionIdsExhausted => "session_ids_exhausted",
        }
    }
}

/// Result alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, RetryError>;
