//! Core library for packing square photos into the opaque region of a mask.
//!
//! - Validity rule: `can_place` (one-pixel margin, 90% mask coverage, overlap budget)
//! - Rendering: `MosaicPacker::generate` walks the scale cascade {1.0, 0.75, 0.55, 0.35}
//!   with a raster scan and composites photos onto an RGBA canvas
//! - Estimation: `estimate_fill` and `rank` simulate candidate settings without pixels
//!
//! Quick example:
//! ```ignore
//! use image::ImageReader;
//! use mosaic_packer_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let logo = ImageReader::open("logo.png")?.decode()?;
//! let mask = MaskModel::from_image(&logo)?;
//! let photos = vec![Photo::from_dynamic("a", &ImageReader::open("a.jpg")?.decode()?)];
//! let best = rank(&mask, photos.len());
//! let cfg = best.first().map(|r| r.config).unwrap_or_default();
//! let out = generate_mosaic(&mask, photos, cfg, 42)?;
//! println!("{}", out.stats(&mask).summary());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod mask;
pub mod model;
pub mod occupancy;
pub mod packer;
pub mod placement;
pub mod ranking;

pub use config::*;
pub use error::*;
pub use export::*;
pub use mask::*;
pub use model::*;
pub use occupancy::*;
pub use packer::mosaic::{MosaicPacker, PackingOutcome, Photo, generate_mosaic};
pub use packer::simulation::{estimate_fill, simulate};
pub use packer::{CancelToken, ScanReport, TileSink, scan_pass};
pub use placement::*;
pub use ranking::*;

/// Convenience prelude for common types and functions.
/// Importing `mosaic_packer_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::compositing::{Compositor, ImageCompositor};
    pub use crate::config::{ExhaustionPolicy, MosaicConfig, MosaicConfigBuilder, RankerConfig};
    pub use crate::mask::MaskModel;
    pub use crate::model::{MosaicStats, PassProgress, PassSummary, SimulationResult, TilePlacement};
    pub use crate::occupancy::OccupancyGrid;
    pub use crate::packer::CancelToken;
    pub use crate::placement::can_place;
    pub use crate::{
        MosaicPacker, PackingOutcome, Photo, estimate_fill, generate_mosaic, rank,
        rank_configurations,
    };
}
