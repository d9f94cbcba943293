//! CLI-specific error types
//!
//! Everything here is fatal and happens before the first destructive step:
//! the process prints the error and exits without locking, elevating, or
//! touching a device.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Fatal pre-flight errors
#[derive(Debug, Error)]
pub enum CliError {
    /// The policy file was unreadable, malformed, or invalid
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The elevate wrapper could not be executed; the run never gained
    /// erase privilege
    #[error("privilege elevation failed: {source}")]
    Elevation {
        /// Error from launching the elevate wrapper
        source: io::Error,
    },
}
