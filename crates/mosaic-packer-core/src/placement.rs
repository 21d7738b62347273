use crate::config::{MASK_COVERAGE_THRESHOLD, MIN_TILE_SIZE, SCALE_CASCADE};
use crate::mask::MaskModel;
use crate::occupancy::OccupancyGrid;

/// Decides whether a `size`×`size` tile may be placed at `(x, y)`.
///
/// Rejects, in order, when:
/// 1. the square does not satisfy `x + size < width` and `y + size < height`
///    (the last row and column are never covered);
/// 2. fewer than 90% of its pixels are opaque in `mask`;
/// 3. more than `overlap_budget` of its pixels are already claimed in `occupancy`.
///
/// Does not mark anything; the caller claims the region after acceptance.
pub fn can_place(
    occupancy: &OccupancyGrid,
    mask: &MaskModel,
    x: u32,
    y: u32,
    size: u32,
    overlap_budget: u64,
) -> bool {
    let (width, height) = mask.dimensions();
    let right = x as u64 + size as u64;
    let bottom = y as u64 + size as u64;
    if right >= width as u64 || bottom >= height as u64 {
        return false;
    }

    let opaque = match mask.opaque_count(x, y, size) {
        Ok(n) => n,
        Err(_) => return false,
    };
    let required = (size as u64 * size as u64) as f64 * MASK_COVERAGE_THRESHOLD;
    if (opaque as f64) < required {
        return false;
    }

    occupancy.count_occupied(x, y, size) <= overlap_budget
}

/// How the stride of a pass is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrideRule {
    /// `size * (1 - overlap)`: used by the simulation, which ignores spacing.
    Simulation,
    /// `size * (1 + spacing - overlap)`: used when rendering.
    Render,
}

/// Geometry of one pass of the scale cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassPlan {
    /// Position in the cascade, starting at 0.
    pub index: usize,
    pub scale: f64,
    /// Tile side in pixels for this pass.
    pub size: u32,
    /// Distance between neighbouring scan origins, at least 1.
    pub step: u32,
    /// Claimed pixels tolerated inside a candidate square.
    pub overlap_budget: u64,
}

impl PassPlan {
    /// Plans pass `index` for `scale`, or `None` when the tile would be smaller
    /// than [`MIN_TILE_SIZE`].
    pub fn new(
        index: usize,
        scale: f64,
        tile_size: u32,
        spacing_percent: u32,
        overlap_percent: u32,
        rule: StrideRule,
    ) -> Option<Self> {
        let size = (tile_size as f64 * scale) as u32;
        if size < MIN_TILE_SIZE {
            return None;
        }
        let overlap = overlap_percent as f64 / 100.0;
        let factor = match rule {
            StrideRule::Simulation => 1.0 - overlap,
            StrideRule::Render => 1.0 + spacing_percent as f64 / 100.0 - overlap,
        };
        // float -> int casts saturate, so a negative factor yields 0 before the clamp
        let step = ((size as f64 * factor) as u32).max(1);
        let overlap_budget = ((size as u64 * size as u64) as f64 * overlap) as u64;
        Some(Self {
            index,
            scale,
            size,
            step,
            overlap_budget,
        })
    }

    /// Scan origins along an axis of `extent` pixels: `0, step, 2*step, …` while
    /// `origin < extent - size`.
    pub fn origins(&self, extent: u32) -> std::iter::StepBy<std::ops::Range<u32>> {
        let end = extent.saturating_sub(self.size);
        (0..end).step_by(self.step as usize)
    }
}

/// Plans every pass of the cascade; skipped passes are `None`.
pub fn plan_cascade(
    tile_size: u32,
    spacing_percent: u32,
    overlap_percent: u32,
    rule: StrideRule,
) -> Vec<Option<PassPlan>> {
    SCALE_CASCADE
        .iter()
        .enumerate()
        .map(|(index, &scale)| {
            PassPlan::new(
                index,
                scale,
                tile_size,
                spacing_percent,
                overlap_percent,
                rule,
            )
        })
        .collect()
}
