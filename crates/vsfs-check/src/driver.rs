use crate::checks::run_checks;
use crate::context::FsckContext;
use crate::repair::repair;
use crate::report::CheckReport;
use serde::Serialize;
use tracing::info;
use vsfs_block::ByteDevice;
use vsfs_error::Result;

/// Result of repairing and re-verifying.
#[derive(Debug, Clone, Serialize)]
pub struct RepairOutcome {
    /// Corrections applied by the repair sweep.
    pub fixes: u32,
    /// Fully independent second verification pass over the repaired image.
    pub recheck: CheckReport,
}

/// Result of one complete check/repair cycle.
#[derive(Debug, Clone, Serialize)]
pub struct FsckOutcome {
    /// First verification pass over the image as found.
    pub initial: CheckReport,
    /// Present only when the first pass found errors.
    pub repair: Option<RepairOutcome>,
}

impl FsckOutcome {
    /// Error count of the first pass.
    #[must_use]
    pub fn original_errors(&self) -> usize {
        self.initial.total_errors()
    }

    /// Errors still present after the cycle: the re-check count when a
    /// repair ran, otherwise the first-pass count.
    #[must_use]
    pub fn remaining_errors(&self) -> usize {
        self.repair
            .as_ref()
            .map_or(self.initial.total_errors(), |r| r.recheck.total_errors())
    }

    /// Whether the image ended the cycle fully consistent.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.remaining_errors() == 0
    }
}

/// One check/repair cycle against `device`.
///
/// Runs all five checkers; if any error was found, repairs, then reloads
/// the metadata from the device and re-runs all five checkers from scratch
/// — fresh context, fresh reference graph, every predicate re-evaluated
/// against the now-repaired on-disk state. Nothing from the first pass is
/// reused; the re-check self-validates the repair instead of trusting it.
pub fn run(device: &dyn ByteDevice) -> Result<FsckOutcome> {
    let mut ctx = FsckContext::load(device)?;
    let initial = run_checks(&ctx)?;
    info!(errors = initial.total_errors(), "initial check pass complete");

    if initial.is_clean() {
        return Ok(FsckOutcome {
            initial,
            repair: None,
        });
    }

    let fixes = repair(&mut ctx)?;
    drop(ctx);

    let ctx = FsckContext::load(device)?;
    let recheck = run_checks(&ctx)?;
    info!(
        fixes,
        remaining = recheck.total_errors(),
        "re-check after repair complete"
    );

    Ok(FsckOutcome {
        initial,
        repair: Some(RepairOutcome { fixes, recheck }),
    })
}
