use crate::config::ExhaustionPolicy;
use crate::error::Result;
use crate::mask::MaskModel;
use crate::occupancy::OccupancyGrid;
use crate::placement::{PassPlan, can_place};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::trace;

pub mod mosaic;
pub mod simulation;

/// Receives accepted placements during a raster scan.
///
/// The simulation counts against a budget; the real packer pops a photo and
/// composites it. The scan claims the region in the occupancy grid after
/// `place` returns successfully.
pub trait TileSink {
    /// False once nothing is left to place.
    fn has_supply(&self) -> bool;
    fn place(&mut self, pass: &PassPlan, x: u32, y: u32) -> Result<()>;
}

/// Cooperative cancellation flag shared between a run and its controller.
///
/// Checked before every raster-scan step; a cancelled run keeps whatever it
/// placed so far.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Result of scanning one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub placed: usize,
    /// Candidate origins handed to the validator.
    pub candidates: usize,
    pub cancelled: bool,
}

/// Row-major raster scan of one pass.
///
/// Visits `y` then `x` over [`PassPlan::origins`]. When the sink runs dry the
/// current row is abandoned; with [`ExhaustionPolicy::StopPass`] the whole pass
/// is. Accepted squares are handed to `sink` and then claimed in `occupancy`,
/// so every later candidate in the same pass sees them.
pub fn scan_pass<S: TileSink + ?Sized>(
    mask: &MaskModel,
    occupancy: &mut OccupancyGrid,
    plan: &PassPlan,
    policy: ExhaustionPolicy,
    sink: &mut S,
    cancel: Option<&CancelToken>,
) -> Result<ScanReport> {
    let (width, height) = mask.dimensions();
    let mut report = ScanReport::default();
    'rows: for y in plan.origins(height) {
        for x in plan.origins(width) {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                report.cancelled = true;
                break 'rows;
            }
            if !sink.has_supply() {
                match policy {
                    ExhaustionPolicy::StopRow => break,
                    ExhaustionPolicy::StopPass => break 'rows,
                }
            }
            report.candidates += 1;
            if can_place(occupancy, mask, x, y, plan.size, plan.overlap_budget) {
                sink.place(plan, x, y)?;
                occupancy.mark(x, y, plan.size);
                report.placed += 1;
                trace!(pass = plan.index, x, y, size = plan.size, "tile placed");
            }
        }
    }
    Ok(report)
}
