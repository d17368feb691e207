//! Retry-admission controller.
//!
//! Callers pick a [`BackoffPolicy`], open a [`Session`] on a
//! [`SessionRegistry`], and call [`Session::allow_retry`] from their own
//! retry loop. The library never runs the retried operation itself.

pub mod backoff;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use backoff::{Admission, BackoffPolicy, StrategyKind};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::RetryError;
pub use session::{create_session, Session, SessionId, SessionRegistry};
