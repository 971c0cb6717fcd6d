//! Subcommand implementations.

pub mod check_cmd;
pub mod output;
pub mod run_cmd;
