//! CLI command handlers. Each command is in its own file.

mod run;
mod schedule;

pub use run::run_retry;
pub use schedule::run_schedule;
