//! Erase actions
//!
//! The named, best-effort, idempotent operations the orchestrator applies to
//! device paths: secure discard, plain discard, cryptographic header erase,
//! hardware (self-encrypting-drive) erase, and the wipe-notice write. Each
//! tool action wraps an external destructive primitive behind the
//! [`CommandRunner`] seam; [`ToolBackend`] adapts the whole set to the
//! orchestrator's [`EraseBackend`](crate::orchestrator::EraseBackend)
//! contract.
//!
//! Applying an action twice to the same path must never panic or escalate
//! into a hard error. A device that is already discarded or whose header is
//! already gone simply makes the external tool fail, and that is an outcome
//! to log, not a reason to stop the run.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::observability::Logger;
use crate::orchestrator::EraseBackend;
use crate::platform;

/// Result of applying one action to one device path.
///
/// Never propagated as a hard error; the orchestrator logs it and moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The primitive was handed the device and ran to completion
    Applied,
    /// The action does not apply to this path (e.g. notice on a non-block file)
    NotApplicable,
    /// The external tool could not be launched or waited on
    ExternalToolFailed,
    /// The notice writer could not open or write the device
    OpenFailed,
}

impl ActionOutcome {
    /// Returns the string representation used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionOutcome::Applied => "applied",
            ActionOutcome::NotApplicable => "not_applicable",
            ActionOutcome::ExternalToolFailed => "external_tool_failed",
            ActionOutcome::OpenFailed => "open_failed",
        }
    }
}

/// Seam for launching external destructive tools.
///
/// `run` receives a complete command line and returns `Err` only when the
/// command could not be launched or waited on. The tool's exit status is
/// deliberately not inspected: an already-wiped device makes the tool fail,
/// and aborting the run over that would leave the machine powered on.
pub trait CommandRunner {
    /// Execute `command_line` to completion
    fn run(&mut self, command_line: &str) -> io::Result<()>;
}

/// Real runner: hands the command line to `sh -c` and waits for it.
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&mut self, command_line: &str) -> io::Result<()> {
        // Exit status intentionally unused; see trait contract
        let _ = Command::new("sh").arg("-c").arg(command_line).status()?;
        Ok(())
    }
}

/// Construct `"<base> <path>"`.
///
/// Warning: the device path is NOT shell-escaped. Callers must guarantee
/// device paths never contain shell metacharacters; this tool only ever
/// feeds it paths enumerated from the device root.
pub fn command_line(base: &str, path: &Path) -> String {
    format!("{} {}", base, path.display())
}

/// The destructive base commands, one per erase primitive.
///
/// Defaults match the non-interactive forms the tool was built around;
/// every field can be overridden from the policy file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSet {
    /// Secure discard: mandated to zero all physical copies, including
    /// over-provisioned and wear-leveled ones
    #[serde(default = "default_secure_discard")]
    pub secure_discard: String,
    /// Plain discard fallback for devices without secure-discard support
    #[serde(default = "default_plain_discard")]
    pub plain_discard: String,
    /// Encrypted-volume header key erasure
    #[serde(default = "default_header_erase")]
    pub header_erase: String,
    /// Hardware-backed factory-reset key erasure for self-encrypting drives
    #[serde(default = "default_hardware_erase")]
    pub hardware_erase: String,
}

fn default_secure_discard() -> String {
    "blkdiscard -sfv".to_string()
}
fn default_plain_discard() -> String {
    "blkdiscard -fv".to_string()
}
fn default_header_erase() -> String {
    // -q suppresses confirmation questions; a panic run is non-interactive
    "cryptsetup erase -q".to_string()
}
fn default_hardware_erase() -> String {
    "cryptsetup erase --hw-opal-factory-reset".to_string()
}

impl Default for ToolSet {
    fn default() -> Self {
        Self {
            secure_discard: default_secure_discard(),
            plain_discard: default_plain_discard(),
            header_erase: default_header_erase(),
            hardware_erase: default_hardware_erase(),
        }
    }
}

/// Notice written to each wiped block device. Tells anyone who later images
/// the drive (or pressures the owner for keys) that there is nothing left to
/// disclose. The trailing NUL is part of the on-disk format.
pub const ERASE_NOTICE: &[u8] = b"Panic handler: Device wiped [ data rendered permananetly irrecoverable through secure erasure ]\n\0";

/// Write the erase notice to `path` if it is a block-special device.
///
/// Anything that is not a block device yields `NotApplicable` and is not
/// touched. `OpenFailed` covers a block device that could not be opened or
/// written, so the two cases log distinctly.
pub fn write_notice(path: &Path) -> ActionOutcome {
    use std::os::unix::fs::FileTypeExt;

    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(_) => return ActionOutcome::OpenFailed,
    };
    if !metadata.file_type().is_block_device() {
        return ActionOutcome::NotApplicable;
    }

    let mut device = match OpenOptions::new().write(true).open(path) {
        Ok(device) => device,
        Err(_) => return ActionOutcome::OpenFailed,
    };
    match device.write_all(ERASE_NOTICE) {
        Ok(()) => ActionOutcome::Applied,
        Err(_) => ActionOutcome::OpenFailed,
    }
}

/// Adapter wiring the erase actions to a [`CommandRunner`].
///
/// This is the production implementation of the orchestrator's
/// [`EraseBackend`] seam: every destructive method builds a command line
/// from the [`ToolSet`], runs it, logs one event line, and reports the
/// outcome. The barrier is sync(2).
pub struct ToolBackend<R: CommandRunner> {
    tools: ToolSet,
    runner: R,
}

impl<R: CommandRunner> ToolBackend<R> {
    /// Create a backend over the given tool commands and runner
    pub fn new(tools: ToolSet, runner: R) -> Self {
        Self { tools, runner }
    }

    fn run_tool(&mut self, action: &'static str, base: &str, path: &Path) -> ActionOutcome {
        let line = command_line(base, path);
        let outcome = match self.runner.run(&line) {
            Ok(()) => ActionOutcome::Applied,
            Err(_) => ActionOutcome::ExternalToolFailed,
        };
        log_outcome(action, path, outcome);
        outcome
    }
}

fn log_outcome(action: &'static str, path: &Path, outcome: ActionOutcome) {
    let device = path.display().to_string();
    let fields = [("action", action), ("device", device.as_str()), ("outcome", outcome.as_str())];
    match outcome {
        ActionOutcome::Applied | ActionOutcome::NotApplicable => Logger::info("ERASE_ACTION", &fields),
        ActionOutcome::ExternalToolFailed | ActionOutcome::OpenFailed => {
            Logger::warn("ERASE_ACTION", &fields)
        }
    }
}

impl<R: CommandRunner> EraseBackend for ToolBackend<R> {
    fn hardware_crypto_erase(&mut self, path: &Path) -> ActionOutcome {
        let base = self.tools.hardware_erase.clone();
        self.run_tool("hardware_crypto_erase", &base, path)
    }

    fn crypto_erase(&mut self, path: &Path) -> ActionOutcome {
        let base = self.tools.header_erase.clone();
        self.run_tool("crypto_erase", &base, path)
    }

    fn secure_discard(&mut self, path: &Path) -> ActionOutcome {
        let base = self.tools.secure_discard.clone();
        self.run_tool("secure_discard", &base, path)
    }

    fn plain_discard(&mut self, path: &Path) -> ActionOutcome {
        let base = self.tools.plain_discard.clone();
        self.run_tool("plain_discard", &base, path)
    }

    fn write_notice(&mut self, path: &Path) -> ActionOutcome {
        let outcome = write_notice(path);
        log_outcome("write_notice", path, outcome);
        outcome
    }

    fn barrier(&mut self) {
        platform::sync_all();
        Logger::info("DURABILITY_BARRIER", &[]);
    }
}
