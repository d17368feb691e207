//! Backoff policies.
//!
//! A policy is a strategy kind (linear or exponential) plus one numeric
//! parameter. Given the time since the last admitted attempt and the number
//! of attempts admitted so far, it decides whether the next attempt may go
//! ahead.

mod kind;
mod policy;

pub use kind::StrategyKind;
pub use policy::{Admission, BackoffPolicy};
