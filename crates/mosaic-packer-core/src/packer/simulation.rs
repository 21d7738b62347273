//! Imageless packing trials used to estimate coverage before rendering.

use crate::config::{ExhaustionPolicy, MosaicConfig};
use crate::error::Result;
use crate::mask::MaskModel;
use crate::model::SimulationResult;
use crate::occupancy::OccupancyGrid;
use crate::packer::{TileSink, scan_pass};
use crate::placement::{PassPlan, StrideRule, plan_cascade};
use tracing::{debug, instrument};

/// Photo budget of a simulated run.
struct BudgetSink {
    remaining: usize,
}

impl TileSink for BudgetSink {
    fn has_supply(&self) -> bool {
        self.remaining > 0
    }
    fn place(&mut self, _pass: &PassPlan, _x: u32, _y: u32) -> Result<()> {
        self.remaining -= 1;
        Ok(())
    }
}

/// Runs the cascade against a throwaway occupancy grid and returns
/// `(photos_placed, fill_ratio)`.
///
/// Stride is `size * (1 - overlap)`; spacing plays no part. Deterministic for
/// fixed inputs. The fill ratio is 0 for a mask without opaque pixels.
#[instrument(skip_all, fields(tile_size = tile_size, overlap_percent = overlap_percent))]
pub fn estimate_fill(
    mask: &MaskModel,
    photo_budget: usize,
    tile_size: u32,
    overlap_percent: u32,
    policy: ExhaustionPolicy,
) -> (usize, f64) {
    let mut occupancy = OccupancyGrid::for_mask(mask);
    let mut sink = BudgetSink {
        remaining: photo_budget,
    };
    let mut placed = 0usize;
    for plan in plan_cascade(tile_size, 0, overlap_percent, StrideRule::Simulation)
        .into_iter()
        .flatten()
    {
        // BudgetSink never fails and no cancel token is passed
        let report = match scan_pass(mask, &mut occupancy, &plan, policy, &mut sink, None) {
            Ok(r) => r,
            Err(_) => break,
        };
        placed += report.placed;
        debug!(
            pass = plan.index,
            size = plan.size,
            step = plan.step,
            budget = plan.overlap_budget,
            placed = report.placed,
            "simulated pass"
        );
    }
    (placed, occupancy.fill_ratio(mask))
}

/// Runs [`estimate_fill`] for one configuration and wraps the result.
pub fn simulate(mask: &MaskModel, photo_count: usize, cfg: &MosaicConfig) -> SimulationResult {
    let (photos_placed, fill_ratio) = estimate_fill(
        mask,
        photo_count,
        cfg.tile_size,
        cfg.overlap_percent,
        cfg.exhaustion,
    );
    SimulationResult {
        config: *cfg,
        photos_placed,
        fill_ratio,
    }
}
