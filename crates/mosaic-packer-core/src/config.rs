use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Scale factors applied to the base tile size, one per pass, largest first.
pub const SCALE_CASCADE: [f64; 4] = [1.0, 0.75, 0.55, 0.35];

/// Passes whose scaled tile size falls below this many pixels are skipped.
pub const MIN_TILE_SIZE: u32 = 15;

/// Fraction of a candidate square that must be opaque in the mask.
pub const MASK_COVERAGE_THRESHOLD: f64 = 0.9;

/// Simulated fill ratios are shown to users capped at this value.
pub const DISPLAY_FILL_CAP: f64 = 0.98;

/// Coverage considered a good result when reporting statistics.
pub const FILL_TARGET: f64 = 0.75;

/// Channel value above which an RGB pixel counts as "white" for masks without alpha.
pub const WHITE_TOLERANCE: u8 = 200;

/// What the raster scan does once the photo supply runs out.
///
/// `StopRow` abandons only the current row; the following rows of the same pass are
/// still visited (and place nothing). `StopPass` abandons the rest of the pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    #[default]
    StopRow,
    StopPass,
}

impl FromStr for ExhaustionPolicy {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "row" | "stop_row" => Ok(Self::StopRow),
            "pass" | "stop_pass" => Ok(Self::StopPass),
            _ => Err(()),
        }
    }
}

/// Settings for one mosaic run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MosaicConfig {
    /// Base side length in pixels; each pass scales it by [`SCALE_CASCADE`].
    pub tile_size: u32,
    /// Widens the scan stride (0..=30 in the UI).
    pub spacing_percent: u32,
    /// Tolerated overlap as a share of the tile area; also shrinks the stride (0..=50 in the UI).
    pub overlap_percent: u32,
    #[serde(default)]
    pub exhaustion: ExhaustionPolicy,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            tile_size: 110,
            spacing_percent: 0,
            overlap_percent: 25,
            exhaustion: ExhaustionPolicy::StopRow,
        }
    }
}

impl MosaicConfig {
    /// Validates the configuration against the documented user-facing ranges.
    ///
    /// The packing functions never call this: they accept any tile size and
    /// percentage and stay deterministic. Front ends call it before a run.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::MosaicError;

        if self.tile_size == 0 {
            return Err(MosaicError::InvalidConfig(
                "tile_size must be at least 1".into(),
            ));
        }
        if self.spacing_percent > 30 {
            return Err(MosaicError::InvalidConfig(format!(
                "spacing_percent ({}) must be within 0..=30",
                self.spacing_percent
            )));
        }
        if self.overlap_percent > 50 {
            return Err(MosaicError::InvalidConfig(format!(
                "overlap_percent ({}) must be within 0..=50",
                self.overlap_percent
            )));
        }
        Ok(())
    }

    /// Create a fluent builder for `MosaicConfig`.
    pub fn builder() -> MosaicConfigBuilder {
        MosaicConfigBuilder::new()
    }
}

/// Builder for `MosaicConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct MosaicConfigBuilder {
    cfg: MosaicConfig,
}

impl MosaicConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: MosaicConfig::default(),
        }
    }
    pub fn tile_size(mut self, v: u32) -> Self {
        self.cfg.tile_size = v;
        self
    }
    pub fn spacing_percent(mut self, v: u32) -> Self {
        self.cfg.spacing_percent = v;
        self
    }
    pub fn overlap_percent(mut self, v: u32) -> Self {
        self.cfg.overlap_percent = v;
        self
    }
    pub fn exhaustion(mut self, v: ExhaustionPolicy) -> Self {
        self.cfg.exhaustion = v;
        self
    }
    pub fn build(self) -> MosaicConfig {
        self.cfg
    }
}

/// Candidate grid searched by the configuration ranker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RankerConfig {
    #[serde(default = "default_tile_sizes")]
    pub tile_sizes: Vec<u32>,
    #[serde(default = "default_overlap_percents")]
    pub overlap_percents: Vec<u32>,
    /// Reported with every result; the estimator's stride ignores spacing.
    #[serde(default)]
    pub spacing_percent: u32,
    /// Number of results kept after sorting.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Evaluate trials in parallel when the "parallel" feature is on.
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub exhaustion: ExhaustionPolicy,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            tile_sizes: default_tile_sizes(),
            overlap_percents: default_overlap_percents(),
            spacing_percent: 0,
            top_n: default_top_n(),
            parallel: false,
            exhaustion: ExhaustionPolicy::StopRow,
        }
    }
}

impl RankerConfig {
    /// All candidate configurations in search order (tile size major, overlap minor).
    pub fn candidates(&self) -> Vec<MosaicConfig> {
        let mut out = Vec::with_capacity(self.tile_sizes.len() * self.overlap_percents.len());
        for &tile_size in &self.tile_sizes {
            for &overlap_percent in &self.overlap_percents {
                out.push(MosaicConfig {
                    tile_size,
                    spacing_percent: self.spacing_percent,
                    overlap_percent,
                    exhaustion: self.exhaustion,
                });
            }
        }
        out
    }
}

fn default_tile_sizes() -> Vec<u32> {
    vec![70, 90, 110, 130, 150]
}
fn default_overlap_percents() -> Vec<u32> {
    vec![15, 25, 35]
}
fn default_top_n() -> usize {
    5
}
