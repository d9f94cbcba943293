//! Erase orchestration
//!
//! Sequences walks over the device root according to the erase mode,
//! inserting durability barriers between destructive stages. The ordering
//! discipline is the whole point of this module: every header erasure must
//! be committed to stable storage before any discard starts, and every
//! stage must finish for all devices before the next stage touches any of
//! them. The orchestrator drives an [`EraseBackend`], which keeps the
//! sequencing logic testable without a single real device.

use std::path::Path;

use crate::config::{EraseMode, RunConfig};
use crate::observability::Logger;
use crate::walker::{walk, EntryKind, RecursionBudget, WalkError};

pub use crate::actions::ActionOutcome;

/// Depth 1 reaches the top-level device nodes and one level of grouping
/// (e.g. mapper nodes) without descending into deep irrelevant subtrees.
const DEVICE_SCAN_DEPTH: RecursionBudget = RecursionBudget::Bounded(1);

/// The destructive primitives and the durability barrier, as one seam.
///
/// The production implementation is
/// [`ToolBackend`](crate::actions::ToolBackend); tests substitute a
/// recording fake to assert call order.
pub trait EraseBackend {
    /// Hardware-backed (self-encrypting-drive) factory-reset key erasure
    fn hardware_crypto_erase(&mut self, path: &Path) -> ActionOutcome;
    /// Key erasure against an encrypted-volume header
    fn crypto_erase(&mut self, path: &Path) -> ActionOutcome;
    /// Discard that zeroes all physical copies of the data
    fn secure_discard(&mut self, path: &Path) -> ActionOutcome;
    /// Non-secure discard fallback
    fn plain_discard(&mut self, path: &Path) -> ActionOutcome;
    /// Write the wipe notice to a block device
    fn write_notice(&mut self, path: &Path) -> ActionOutcome;
    /// Flush all pending writes across all devices
    fn barrier(&mut self);
}

/// One full walk of the device root applying a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    HardwareCryptoErase,
    CryptoErase,
    SecureDiscard,
    PlainDiscard,
    WriteNotice,
}

impl Pass {
    fn as_str(&self) -> &'static str {
        match self {
            Pass::HardwareCryptoErase => "hardware_crypto_erase",
            Pass::CryptoErase => "crypto_erase",
            Pass::SecureDiscard => "secure_discard",
            Pass::PlainDiscard => "plain_discard",
            Pass::WriteNotice => "write_notice",
        }
    }
}

/// Drives the erase stages over a device root.
pub struct EraseOrchestrator<'a, B: EraseBackend> {
    config: &'a RunConfig,
    device_root: &'a Path,
    backend: &'a mut B,
}

impl<'a, B: EraseBackend> EraseOrchestrator<'a, B> {
    /// Create an orchestrator for one run
    pub fn new(config: &'a RunConfig, device_root: &'a Path, backend: &'a mut B) -> Self {
        Self {
            config,
            device_root,
            backend,
        }
    }

    /// Execute the erase stage for the configured mode.
    ///
    /// Never returns an error: a failed walk abandons the remaining erase
    /// stages, but the shutdown decision is honored regardless. Leaving
    /// the machine unlocked and powered on is the worst outcome there is.
    pub fn run(&mut self) {
        match self.config.erase_mode {
            EraseMode::Opal | EraseMode::Discard => {
                if let Err(err) = self.destructive_stages() {
                    let detail = err.to_string();
                    Logger::error("ERASE_STAGE_ABANDONED", &[("error", detail.as_str())]);
                    // Commit whatever partial erasures completed before the failure
                    self.backend.barrier();
                }
            }
            EraseMode::None => {
                Logger::info("ERASE_SKIPPED", &[("reason", "erase mode none")]);
                self.backend.barrier();
            }
        }
    }

    fn destructive_stages(&mut self) -> Result<(), WalkError> {
        if self.config.erase_mode == EraseMode::Opal {
            // Opal is "hardware erase first, then also the discard sequence"
            self.pass(Pass::HardwareCryptoErase)?;
        }

        // Header erasures run as their own pass so the barrier commits them
        // for every device together, before any discard begins. A crash
        // between devices must not leave a partially-committed header.
        self.pass(Pass::CryptoErase)?;
        self.backend.barrier();

        if self.config.do_trim {
            // Secure discard is attempted for every device before any device
            // receives the plain fallback.
            self.pass(Pass::SecureDiscard)?;
            self.pass(Pass::PlainDiscard)?;
        }

        if self.config.do_notify {
            self.pass(Pass::WriteNotice)?;
        }

        self.backend.barrier();
        Ok(())
    }

    fn pass(&mut self, pass: Pass) -> Result<(), WalkError> {
        Logger::info("ERASE_PASS", &[("pass", pass.as_str())]);

        let backend = &mut *self.backend;
        let mut visit = |path: &Path, _kind: EntryKind| {
            // Outcomes are logged by the backend and never abort the walk
            let _ = match pass {
                Pass::HardwareCryptoErase => backend.hardware_crypto_erase(path),
                Pass::CryptoErase => backend.crypto_erase(path),
                Pass::SecureDiscard => backend.secure_discard(path),
                Pass::PlainDiscard => backend.plain_discard(path),
                Pass::WriteNotice => backend.write_notice(path),
            };
        };
        walk(self.device_root, DEVICE_SCAN_DEPTH, &mut visit)
    }
}
