//! Session identifiers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, RetryError};

const ID_LEN: usize = 10;
const ALPHABET: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";
/// 36^10: every value below this renders to a distinct 10-character id.
const ID_SPACE: u64 = 3_656_158_440_062_976;

/// Opaque key of a session in the attempt table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out ids that are unique for the lifetime of the owning registry.
#[derive(Debug, Default)]
pub(crate) struct SessionIdSource {
    next: AtomicU64,
}

impl SessionIdSource {
    #[cfg(test)]
    pub(crate) fn starting_at(next: u64) -> Self {
        Self {
            next: AtomicU64::new(next),
        }
    }

    pub(crate) fn next_id(&self) -> Result<SessionId> {
        let n = self
            .next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                if n < ID_SPACE {
                    Some(n + 1)
                } else {
                    None
                }
            })
            .map_err(|_| RetryError::SessionIdsExhausted)?;
        Ok(SessionId(render(n)))
    }
}

/// Fixed-width base-36 rendering. The first character carries the lowest
/// digit so consecutive ids do not share a long common prefix.
fn render(mut n: u64) -> String {
    let mut out = String::with_capacity(ID_LEN);
    for _ in 0..ID_LEN {
        out.push(char::from(ALPHABET[(n % 36) as usize]));
        n /= 36;
    }
    out
}
