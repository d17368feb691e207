//! Retry sessions and the registry that holds their attempt counts.
//!
//! A session moves `OPEN -> (admission checks)* -> CLOSED`. Once its budget is
//! spent it stays open but never admits again; closing removes its entry from
//! the registry, after which admission checks fail with `InvalidSession`.

mod id;
mod registry;
#[allow(clippy::module_inception)]
mod session;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::backoff::BackoffPolicy;
use crate::error::Result;

pub use id::SessionId;
pub use registry::SessionRegistry;
pub use session::Session;

/// Open a session on `registry`. Same as [`SessionRegistry::create_session`].
pub fn create_session(
    registry: &Arc<SessionRegistry>,
    policy: Arc<BackoffPolicy>,
    max_retries: u32,
) -> Result<Session> {
    registry.create_session(policy, max_retries)
}
