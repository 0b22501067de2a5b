//! Command handlers for the Recall CLI.

mod query;
mod rebuild;
mod stats;

pub use query::QueryCommand;
pub use rebuild::RebuildCommand;
pub use stats::StatsCommand;
