//! CLI for scuttle
//!
//! Argument surface, pre-flight errors, and the top-level run sequencing
//! (parse → policy → privilege → lock → erase → shutdown).

mod args;
mod commands;
mod errors;

pub use args::{Cli, DebugToggle, EraseArg};
pub use commands::run;
pub use errors::{CliError, CliResult};
