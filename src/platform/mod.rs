//! Platform collaborators
//!
//! The real implementations of the external seams: the durability barrier,
//! the power primitives, the screen lock, and the privilege-elevation
//! re-invocation. Everything destructive or irreversible lives behind a
//! trait defined next to its consumer (`CommandRunner`, `PowerControl`,
//! `PrivilegeOps`) so the sequencing logic never has to touch a syscall in
//! tests.

use std::ffi::{CString, OsString};
use std::io;
use std::os::unix::ffi::OsStrExt;

use nix::sys::reboot::{reboot, RebootMode};
use nix::unistd;

use crate::actions::CommandRunner;
use crate::observability::Logger;
use crate::shutdown::PowerControl;

/// Flush all pending writes across all devices (sync(2)).
pub fn sync_all() {
    unistd::sync();
}

/// Lock the console, best-effort. The lock command's result is ignored:
/// failing to lock must never stop the erase from starting.
pub fn lock_screen<R: CommandRunner>(runner: &mut R, command: &str) {
    Logger::info("SCREEN_LOCK", &[("command", command)]);
    let _ = runner.run(command);
}

/// Real power primitives: reboot(2) and sleep(3).
pub struct HostPower;

impl PowerControl for HostPower {
    fn power_off(&mut self) -> io::Result<()> {
        match reboot(RebootMode::RB_POWER_OFF) {
            Ok(never) => match never {},
            Err(errno) => Err(io::Error::from_raw_os_error(errno as i32)),
        }
    }

    fn restart(&mut self) -> io::Result<()> {
        match reboot(RebootMode::RB_AUTOBOOT) {
            Ok(never) => match never {},
            Err(errno) => Err(io::Error::from_raw_os_error(errno as i32)),
        }
    }

    fn sleep(&mut self, seconds: u32) -> u32 {
        // sleep(3): returns the unslept remainder when interrupted by a
        // signal, which is exactly the contract PowerControl wants
        unsafe { libc::sleep(seconds) }
    }
}

/// Privilege query and elevation seam.
pub trait PrivilegeOps {
    /// Whether the process already holds erase privilege
    fn is_privileged(&self) -> bool;
    /// Re-invoke the whole process through the elevate wrapper.
    /// Never returns on success; returns the launch error on failure.
    fn elevate_and_rerun(&mut self, args: &[OsString]) -> io::Error;
}

/// Real privilege operations: euid check + execvp through the elevate command.
pub struct HostPrivilege {
    elevate_command: String,
}

impl HostPrivilege {
    /// Create privilege ops around the configured elevate command
    pub fn new(elevate_command: impl Into<String>) -> Self {
        Self {
            elevate_command: elevate_command.into(),
        }
    }
}

impl PrivilegeOps for HostPrivilege {
    fn is_privileged(&self) -> bool {
        unistd::geteuid().is_root()
    }

    fn elevate_and_rerun(&mut self, args: &[OsString]) -> io::Error {
        // argv: [elevate, argv0, argv1, ...]; the wrapper re-runs this
        // process with identical arguments
        let mut argv = Vec::with_capacity(args.len() + 1);
        match CString::new(self.elevate_command.as_bytes()) {
            Ok(cmd) => argv.push(cmd),
            Err(_) => {
                return io::Error::new(io::ErrorKind::InvalidInput, "elevate command contains NUL")
            }
        }
        for arg in args {
            match CString::new(arg.as_bytes()) {
                Ok(arg) => argv.push(arg),
                Err(_) => {
                    return io::Error::new(io::ErrorKind::InvalidInput, "argument contains NUL")
                }
            }
        }

        match unistd::execvp(&argv[0], &argv) {
            Ok(never) => match never {},
            Err(errno) => io::Error::from_raw_os_error(errno as i32),
        }
    }
}
