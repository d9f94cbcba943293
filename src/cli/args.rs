//! Command-line surface
//!
//! Flags:
//! - scuttle [--immediate | --delay <seconds> | --reboot]
//! - scuttle --erase=OPAL | --erase=DISCARD
//! - scuttle --dbg=dry-run|no-erase|keep-alive|skip-trim|skip-notify (repeatable)
//! - scuttle --config <path>
//!
//! Parsing happens before the screen lock, before elevation, and before any
//! destructive step; an unrecognized flag exits non-zero naming the flag.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{EraseMode, RunConfig};
use crate::shutdown::ShutdownMode;

/// scuttle - panic-trigger secure-erase and shutdown orchestrator
#[derive(Parser, Debug)]
#[command(name = "scuttle")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Wait this many seconds before poweroff, giving drives time to TRIM
    /// discarded blocks at the cost of a wider cold-boot window
    #[arg(long, value_name = "SECONDS", group = "shutdown")]
    pub delay: Option<u32>,

    /// Power off immediately (the default)
    #[arg(long, group = "shutdown")]
    pub immediate: bool,

    /// Reboot instead of powering off; relies on firmware to clear RAM
    #[arg(long, group = "shutdown")]
    pub reboot: bool,

    /// Destructive-action family to apply
    #[arg(long, value_enum, value_name = "MODE")]
    pub erase: Option<EraseArg>,

    /// Debug toggles; may be given more than once
    #[arg(long = "dbg", value_enum, value_name = "TOGGLE")]
    pub dbg: Vec<DebugToggle>,

    /// Optional JSON policy file (lock/elevate commands, device root, tools)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// `--erase` values
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseArg {
    /// Hardware factory-reset erase, then the full discard sequence
    #[value(name = "OPAL")]
    Opal,
    /// Header erase plus discard passes
    #[value(name = "DISCARD")]
    Discard,
}

/// `--dbg` values
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugToggle {
    /// No destruction, no shutdown
    #[value(name = "dry-run")]
    DryRun,
    /// No destruction
    #[value(name = "no-erase")]
    NoErase,
    /// No shutdown
    #[value(name = "keep-alive")]
    KeepAlive,
    /// Skip the discard passes
    #[value(name = "skip-trim")]
    SkipTrim,
    /// Skip the wipe notice
    #[value(name = "skip-notify")]
    SkipNotify,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Resolve the flags into the immutable per-run policy.
    ///
    /// Debug toggles apply last, so `--dbg=dry-run` wins over an explicit
    /// shutdown or erase flag.
    pub fn to_run_config(&self) -> RunConfig {
        let mut shutdown_mode = if let Some(seconds) = self.delay {
            ShutdownMode::DelayedPoweroff(seconds)
        } else if self.reboot {
            ShutdownMode::Reboot
        } else {
            ShutdownMode::Poweroff
        };

        let mut erase_mode = match self.erase {
            Some(EraseArg::Opal) => EraseMode::Opal,
            Some(EraseArg::Discard) | None => EraseMode::Discard,
        };

        let mut do_trim = true;
        let mut do_notify = true;

        for toggle in &self.dbg {
            match toggle {
                DebugToggle::DryRun => {
                    shutdown_mode = ShutdownMode::None;
                    erase_mode = EraseMode::None;
                }
                DebugToggle::NoErase => erase_mode = EraseMode::None,
                DebugToggle::KeepAlive => shutdown_mode = ShutdownMode::None,
                DebugToggle::SkipTrim => do_trim = false,
                DebugToggle::SkipNotify => do_notify = false,
            }
        }

        RunConfig {
            erase_mode,
            shutdown_mode,
            do_trim,
            do_notify,
        }
    }
}
