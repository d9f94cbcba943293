//! Shutdown sequencing
//!
//! The terminal stage of a panic run. Each mode trades cold-boot resistance
//! against firmware-level TRIM time differently:
//!
//! - `Poweroff` cuts power as fast as possible, minimizing the window in
//!   which RAM still holds key material.
//! - `DelayedPoweroff` holds the machine on for a fixed number of seconds so
//!   drives can finish TRIMming discarded blocks, at the cost of a wider
//!   cold-boot window. The wait is self-resuming: an interrupted sleep
//!   continues for the remainder rather than counting as done.
//! - `Reboot` relies on the platform firmware to clear memory on the next
//!   boot, which is weaker cold-boot resistance than a true poweroff.
//! - `None` returns control normally; debug and test use only.

use std::io;

use crate::observability::Logger;

/// How the run ends, chosen once from the resolved configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Power off immediately
    Poweroff,
    /// Wait the given number of seconds, then power off
    DelayedPoweroff(u32),
    /// Restart immediately
    Reboot,
    /// No power transition
    None,
}

impl ShutdownMode {
    /// Returns the string representation used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownMode::Poweroff => "poweroff",
            ShutdownMode::DelayedPoweroff(_) => "delayed_poweroff",
            ShutdownMode::Reboot => "reboot",
            ShutdownMode::None => "none",
        }
    }
}

/// Platform power primitives.
///
/// On the real implementation, `power_off` and `restart` do not return on
/// success; an `Err` means the machine is still running. `sleep` has
/// sleep(3) semantics: it returns the unslept remainder when interrupted.
pub trait PowerControl {
    /// Power the host off now
    fn power_off(&mut self) -> io::Result<()>;
    /// Restart the host now
    fn restart(&mut self) -> io::Result<()>;
    /// Sleep up to `seconds`, returning the unslept remainder
    fn sleep(&mut self, seconds: u32) -> u32;
}

/// Executes the selected power transition.
///
/// No transitions between modes at runtime; the only internal state is the
/// delayed-poweroff countdown.
pub struct ShutdownController<'a, P: PowerControl> {
    mode: ShutdownMode,
    power: &'a mut P,
}

impl<'a, P: PowerControl> ShutdownController<'a, P> {
    /// Create a controller for the selected mode
    pub fn new(mode: ShutdownMode, power: &'a mut P) -> Self {
        Self { mode, power }
    }

    /// Run the power transition.
    ///
    /// Under `Poweroff` and `Reboot` on real hardware this never returns;
    /// it returns normally only under `None` or when the power primitive
    /// itself failed (logged FATAL; the host is still up).
    pub fn execute(&mut self) {
        Logger::info("SHUTDOWN", &[("mode", self.mode.as_str())]);
        match self.mode {
            ShutdownMode::Poweroff => self.power_down(),
            ShutdownMode::DelayedPoweroff(seconds) => {
                let delay = seconds.to_string();
                Logger::info("SHUTDOWN_DELAY", &[("seconds", delay.as_str())]);
                let mut remaining = seconds;
                while remaining > 0 {
                    remaining = self.power.sleep(remaining);
                }
                self.power_down();
            }
            ShutdownMode::Reboot => {
                if let Err(err) = self.power.restart() {
                    let detail = err.to_string();
                    Logger::fatal("REBOOT_FAILED", &[("error", detail.as_str())]);
                }
            }
            ShutdownMode::None => {
                Logger::info("SHUTDOWN_SKIPPED", &[("reason", "shutdown mode none")]);
            }
        }
    }

    fn power_down(&mut self) {
        if let Err(err) = self.power.power_off() {
            let detail = err.to_string();
            Logger::fatal("POWEROFF_FAILED", &[("error", detail.as_str())]);
        }
    }
}
