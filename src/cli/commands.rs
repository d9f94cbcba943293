//! Top-level run sequencing
//!
//! The whole panic flow in program order: parse → policy → privilege →
//! lock → erase → shutdown. Nothing after the privilege check is allowed
//! to abort the shutdown stage; the shutdown decision is honored even when
//! erasure failed wholesale, because an unlocked powered-on machine is the
//! outcome this tool exists to prevent.

use std::env;
use std::ffi::OsString;

use crate::actions::{CommandRunner, ShellRunner, ToolBackend};
use crate::config::PanicConfig;
use crate::observability::Logger;
use crate::orchestrator::EraseOrchestrator;
use crate::platform::{self, HostPower, HostPrivilege, PrivilegeOps};
use crate::shutdown::ShutdownController;

use super::args::Cli;
use super::errors::{CliError, CliResult};

/// Run the panic handler end to end.
///
/// Returns only when the run ends without a power transition: either a
/// pre-flight error, or a shutdown mode of none. Under poweroff/reboot the
/// host goes down inside this function.
pub fn run() -> CliResult<()> {
    // Parsing precedes every lock/elevate/destructive step; an unknown
    // flag exits right here, naming the flag.
    let cli = Cli::parse_args();

    let policy = match &cli.config {
        Some(path) => PanicConfig::load(path)?,
        None => PanicConfig::default(),
    };
    let run_config = cli.to_run_config();

    let mut runner = ShellRunner;
    let mut privilege = HostPrivilege::new(policy.elevate_command.clone());
    let argv: Vec<OsString> = env::args_os().collect();
    ensure_privileged(&mut privilege, &mut runner, &policy, &argv)?;

    // Privileged from here on. Lock again even if the pre-elevation path
    // already locked: the elevate wrapper re-ran the whole process.
    platform::lock_screen(&mut runner, &policy.lock_command);

    Logger::info(
        "PANIC_RUN",
        &[
            ("erase_mode", run_config.erase_mode.as_str()),
            ("shutdown_mode", run_config.shutdown_mode.as_str()),
        ],
    );

    let mut backend = ToolBackend::new(policy.tools.clone(), ShellRunner);
    EraseOrchestrator::new(&run_config, &policy.device_root, &mut backend).run();

    let mut power = HostPower;
    ShutdownController::new(run_config.shutdown_mode, &mut power).execute();

    Ok(())
}

/// Re-invoke through the elevate wrapper unless already privileged.
///
/// Lock-before-elevate is policy: locking first closes the console a moment
/// earlier, but only works where elevation is passwordless. On success the
/// wrapper replaces this process, so reaching the `Err` below means the
/// exec itself failed.
fn ensure_privileged<P: PrivilegeOps, R: CommandRunner>(
    privilege: &mut P,
    runner: &mut R,
    policy: &PanicConfig,
    argv: &[OsString],
) -> CliResult<()> {
    if privilege.is_privileged() {
        return Ok(());
    }

    if policy.lock_before_elevate {
        platform::lock_screen(runner, &policy.lock_command);
    }

    let source = privilege.elevate_and_rerun(argv);
    Err(CliError::Elevation { source })
}
