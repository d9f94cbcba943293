//! Run policy
//!
//! Two layers of configuration feed a panic run:
//!
//! - [`PanicConfig`]: site policy loaded once from an optional JSON file:
//!   lock/elevate commands, the device root, the destructive tool command
//!   lines. Everything has a default; an absent file means stock policy.
//! - [`RunConfig`]: the per-run decisions resolved from the command line:
//!   erase mode, shutdown mode, stage toggles. Immutable once resolved and
//!   owned by the orchestration flow for the duration of one run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::ToolSet;
use crate::shutdown::ShutdownMode;

/// Which family of destructive actions the orchestrator applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseMode {
    /// Header erase, then discard passes
    Discard,
    /// Hardware factory-reset erase first, then the full Discard sequence
    Opal,
    /// No destructive action (debug / dry-run)
    None,
}

impl EraseMode {
    /// Returns the string representation used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            EraseMode::Discard => "discard",
            EraseMode::Opal => "opal",
            EraseMode::None => "none",
        }
    }
}

/// The resolved per-run policy. Constructed once from parsed arguments,
/// then passed by reference into the orchestrator and the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Destructive-action family
    pub erase_mode: EraseMode,
    /// How the run ends
    pub shutdown_mode: ShutdownMode,
    /// Whether the discard passes run
    pub do_trim: bool,
    /// Whether the wipe notice is written
    pub do_notify: bool,
}

/// Configuration-file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The policy file could not be read
    #[error("cannot read policy file {path}: {source}")]
    Unreadable {
        /// Path that failed to read
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// The policy file is not valid JSON for this schema
    #[error("invalid policy file {path}: {source}")]
    Invalid {
        /// Path that failed to parse
        path: PathBuf,
        /// Underlying parse error
        source: serde_json::Error,
    },

    /// A field value fails validation
    #[error("invalid policy: {0}")]
    Validation(String),
}

fn default_lock_before_elevate() -> bool {
    true
}
fn default_lock_command() -> String {
    "xflock4".to_string()
}
fn default_elevate_command() -> String {
    "sudo".to_string()
}
fn default_device_root() -> PathBuf {
    PathBuf::from("/dev")
}

/// Site policy for the panic handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanicConfig {
    /// Lock the screen before elevating, not only after.
    ///
    /// `true` assumes passwordless elevation: on a system that prompts for
    /// a password, locking first would leave the prompt behind the lock
    /// screen and the run would stall unelevated.
    #[serde(default = "default_lock_before_elevate")]
    pub lock_before_elevate: bool,

    /// External screen-lock command, run best-effort with no arguments
    #[serde(default = "default_lock_command")]
    pub lock_command: String,

    /// External wrapper used to re-invoke this process with erase privilege
    #[serde(default = "default_elevate_command")]
    pub elevate_command: String,

    /// Root of the device tree to erase
    #[serde(default = "default_device_root")]
    pub device_root: PathBuf,

    /// Destructive tool command lines
    #[serde(default)]
    pub tools: ToolSet,
}

impl Default for PanicConfig {
    fn default() -> Self {
        Self {
            lock_before_elevate: default_lock_before_elevate(),
            lock_command: default_lock_command(),
            elevate_command: default_elevate_command(),
            device_root: default_device_root(),
            tools: ToolSet::default(),
        }
    }
}

impl PanicConfig {
    /// Load policy from a JSON file and validate it
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let config: PanicConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Invalid {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_command.is_empty() {
            return Err(ConfigError::Validation("lock_command must not be empty".into()));
        }
        if self.elevate_command.is_empty() {
            return Err(ConfigError::Validation(
                "elevate_command must not be empty".into(),
            ));
        }
        if !self.device_root.is_absolute() {
            return Err(ConfigError::Validation(format!(
                "device_root must be absolute, got '{}'",
                self.device_root.display()
            )));
        }
        for (name, base) in [
            ("secure_discard", &self.tools.secure_discard),
            ("plain_discard", &self.tools.plain_discard),
            ("header_erase", &self.tools.header_erase),
            ("hardware_erase", &self.tools.hardware_erase),
        ] {
            if base.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "tools.{} must not be empty",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_policy(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("panic.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults_lock_before_elevate_into_dev() {
        let config = PanicConfig::default();
        assert!(config.lock_before_elevate);
        assert_eq!(config.device_root, PathBuf::from("/dev"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_object_loads_as_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_policy(&dir, "{}");
        let config = PanicConfig::load(&path).unwrap();
        assert_eq!(config.lock_command, "xflock4");
        assert_eq!(config.elevate_command, "sudo");
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_policy(
            &dir,
            r#"{"lock_before_elevate": false, "tools": {"header_erase": "header-erase-tool"}}"#,
        );
        let config = PanicConfig::load(&path).unwrap();
        assert!(!config.lock_before_elevate);
        assert_eq!(config.tools.header_erase, "header-erase-tool");
        assert_eq!(config.tools.plain_discard, ToolSet::default().plain_discard);
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let err = PanicConfig::load(&dir.path().join("gone.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }

    #[test]
    fn test_malformed_json_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = write_policy(&dir, "{not json");
        let err = PanicConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_relative_device_root_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_policy(&dir, r#"{"device_root": "dev"}"#);
        let err = PanicConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_empty_tool_command_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_policy(&dir, r#"{"tools": {"secure_discard": ""}}"#);
        let err = PanicConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
