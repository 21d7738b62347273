use crate::config::{DISPLAY_FILL_CAP, FILL_TARGET, MosaicConfig, SCALE_CASCADE};
use serde::{Deserialize, Serialize};

/// A photo placed on the canvas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TilePlacement {
    /// Key of the photo (e.g., its file path).
    pub key: String,
    /// Top-left corner on the canvas.
    pub x: u32,
    pub y: u32,
    /// Side length the photo was resized to.
    pub size: u32,
    /// Cascade pass that placed it, starting at 0.
    pub pass: usize,
}

/// What happened during one pass of a real run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PassSummary {
    pub index: usize,
    pub scale: f64,
    /// Scaled tile size (may be below the minimum for skipped passes).
    pub tile_size: u32,
    /// True when the tile was too small and the pass did not scan.
    pub skipped: bool,
    pub step: u32,
    pub overlap_budget: u64,
    pub placed: usize,
}

/// Progress notification sent after each pass of the cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassProgress {
    pub pass_index: usize,
    pub pass_count: usize,
    pub summary: PassSummary,
}

impl PassProgress {
    /// `(pass_index + 1) / pass_count`.
    pub fn fraction(&self) -> f32 {
        (self.pass_index + 1) as f32 / self.pass_count.max(1) as f32
    }
}

/// Estimated outcome of one candidate configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SimulationResult {
    pub config: MosaicConfig,
    pub photos_placed: usize,
    /// Uncapped ratio used for ranking.
    pub fill_ratio: f64,
}

impl SimulationResult {
    /// Fill percentage as shown to users: capped at 98% and rounded to one decimal.
    pub fn display_fill_percent(&self) -> f64 {
        let pct = (self.fill_ratio * 100.0).min(DISPLAY_FILL_CAP * 100.0);
        (pct * 10.0).round() / 10.0
    }
}

/// Statistics about a finished mosaic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MosaicStats {
    pub photos_placed: usize,
    pub total_photos: usize,
    pub unplaced: usize,
    /// Placements per cascade pass.
    pub placed_per_pass: [usize; SCALE_CASCADE.len()],
    /// Claimed opaque pixels / opaque mask pixels (0.0 to 1.0).
    pub fill_ratio: f64,
    /// Non-transparent canvas pixels / opaque mask pixels.
    /// Can exceed 1.0 when tiles spill over transparent mask pixels.
    pub canvas_coverage: f64,
    pub opaque_mask_pixels: u64,
    /// Coverage reached the 75% goal.
    pub target_reached: bool,
    pub cancelled: bool,
}

impl MosaicStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Photos placed: {}/{}, Fill: {:.1}%, Coverage: {:.1}%, Per pass: {:?}{}",
            self.photos_placed,
            self.total_photos,
            self.fill_ratio * 100.0,
            self.canvas_coverage * 100.0,
            self.placed_per_pass,
            if self.cancelled { " (cancelled)" } else { "" },
        )
    }

    pub(crate) fn target_for(coverage: f64) -> bool {
        coverage >= FILL_TARGET
    }
}
