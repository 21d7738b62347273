use crate::compositing::{Compositor, ImageCompositor, crop_center_square};
use crate::config::{MosaicConfig, SCALE_CASCADE};
use crate::error::{MosaicError, Result};
use crate::mask::MaskModel;
use crate::model::{MosaicStats, PassProgress, PassSummary, TilePlacement};
use crate::occupancy::OccupancyGrid;
use crate::packer::{CancelToken, TileSink, scan_pass};
use crate::placement::{PassPlan, StrideRule, plan_cascade};
use image::{DynamicImage, RgbaImage};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use tracing::{debug, info, instrument, warn};

/// Square photo to place (key + RGBA pixels).
pub struct Photo {
    pub key: String,
    pub image: RgbaImage,
}

impl Photo {
    /// Converts to RGBA and crops the centered square.
    pub fn from_dynamic(key: impl Into<String>, image: &DynamicImage) -> Self {
        Self {
            key: key.into(),
            image: crop_center_square(&image.to_rgba8()),
        }
    }
}

/// Output of a real packing run.
pub struct PackingOutcome {
    pub canvas: RgbaImage,
    pub occupancy: OccupancyGrid,
    /// Accepted placements in placement order.
    pub placements: Vec<TilePlacement>,
    pub passes: Vec<PassSummary>,
    pub photos_placed: usize,
    pub total_photos: usize,
    /// Keys of photos left in the queue, in queue order.
    pub unplaced: Vec<String>,
    /// The run stopped early on a cancel request.
    pub cancelled: bool,
}

impl PackingOutcome {
    /// Computes statistics for this outcome against the mask it was packed into.
    pub fn stats(&self, mask: &MaskModel) -> MosaicStats {
        let opaque = mask.total_opaque_pixels();
        let painted = self.canvas.pixels().filter(|p| p[3] > 0).count() as u64;
        let canvas_coverage = if opaque > 0 {
            painted as f64 / opaque as f64
        } else {
            0.0
        };
        let mut placed_per_pass = [0usize; SCALE_CASCADE.len()];
        for p in &self.passes {
            if let Some(slot) = placed_per_pass.get_mut(p.index) {
                *slot = p.placed;
            }
        }
        MosaicStats {
            photos_placed: self.photos_placed,
            total_photos: self.total_photos,
            unplaced: self.total_photos - self.photos_placed,
            placed_per_pass,
            fill_ratio: self.occupancy.fill_ratio(mask),
            canvas_coverage,
            opaque_mask_pixels: opaque,
            target_reached: MosaicStats::target_for(canvas_coverage),
            cancelled: self.cancelled,
        }
    }
}

/// Pops photos from the front of the queue and draws them.
struct RenderSink<'a, C: Compositor + ?Sized> {
    queue: VecDeque<Photo>,
    canvas: RgbaImage,
    compositor: &'a C,
    placements: Vec<TilePlacement>,
}

impl<C: Compositor + ?Sized> TileSink for RenderSink<'_, C> {
    fn has_supply(&self) -> bool {
        !self.queue.is_empty()
    }

    fn place(&mut self, pass: &PassPlan, x: u32, y: u32) -> Result<()> {
        let Some(photo) = self.queue.pop_front() else {
            return Err(MosaicError::InvalidInput(format!(
                "no photo left for accepted position ({x}, {y})"
            )));
        };
        self.compositor
            .composite(&mut self.canvas, &photo.image, x, y, pass.size)?;
        self.placements.push(TilePlacement {
            key: photo.key,
            x,
            y,
            size: pass.size,
            pass: pass.index,
        });
        Ok(())
    }
}

/// Multi-pass mosaic renderer.
///
/// Shuffles the photos once with the supplied random source, then walks the
/// scale cascade. Each pass raster-scans the mask with stride
/// `size * (1 + spacing - overlap)` and draws the next photo wherever
/// [`can_place`](crate::placement::can_place) accepts.
pub struct MosaicPacker<'a, C: Compositor + ?Sized = ImageCompositor> {
    cfg: MosaicConfig,
    compositor: &'a C,
    progress: Option<Box<dyn FnMut(&PassProgress) + 'a>>,
    cancel: Option<CancelToken>,
}

impl<'a, C: Compositor + ?Sized> MosaicPacker<'a, C> {
    pub fn new(cfg: MosaicConfig, compositor: &'a C) -> Self {
        Self {
            cfg,
            compositor,
            progress: None,
            cancel: None,
        }
    }

    /// Called after each of the cascade passes, skipped ones included.
    pub fn with_progress(mut self, f: impl FnMut(&PassProgress) + 'a) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &MosaicConfig {
        &self.cfg
    }

    #[instrument(skip_all, fields(photos = photos.len(), tile_size = self.cfg.tile_size))]
    /// Packs `photos` into `mask`, consuming them.
    ///
    /// Notes:
    /// - The queue is shuffled once with `rng`; seed it for reproducible output.
    /// - Every pass runs even after the queue empties; it just places nothing.
    /// - On cancellation the partial canvas and occupancy are returned.
    /// - A compositor error aborts the run and is returned as-is; the partial
    ///   canvas is discarded and the photo being drawn counts as consumed.
    pub fn generate<R: Rng + ?Sized>(
        &mut self,
        mask: &MaskModel,
        mut photos: Vec<Photo>,
        rng: &mut R,
    ) -> Result<PackingOutcome> {
        let total_photos = photos.len();
        let (width, height) = mask.dimensions();
        if mask.total_opaque_pixels() == 0 {
            warn!("mask has no opaque pixels; nothing can be placed");
        }

        photos.shuffle(rng);
        let mut sink = RenderSink {
            queue: VecDeque::from(photos),
            canvas: RgbaImage::new(width, height),
            compositor: self.compositor,
            placements: Vec::new(),
        };
        let mut occupancy = OccupancyGrid::for_mask(mask);
        let mut passes = Vec::with_capacity(SCALE_CASCADE.len());
        let mut cancelled = false;

        let plans = plan_cascade(
            self.cfg.tile_size,
            self.cfg.spacing_percent,
            self.cfg.overlap_percent,
            StrideRule::Render,
        );
        let pass_count = plans.len();
        for (index, plan) in plans.into_iter().enumerate() {
            let scale = SCALE_CASCADE[index];
            let summary = match plan {
                None => {
                    debug!(pass = index, "tile below minimum size; pass skipped");
                    PassSummary {
                        index,
                        scale,
                        tile_size: (self.cfg.tile_size as f64 * scale) as u32,
                        skipped: true,
                        step: 0,
                        overlap_budget: 0,
                        placed: 0,
                    }
                }
                Some(plan) => {
                    let report = scan_pass(
                        mask,
                        &mut occupancy,
                        &plan,
                        self.cfg.exhaustion,
                        &mut sink,
                        self.cancel.as_ref(),
                    )?;
                    debug!(
                        pass = index,
                        size = plan.size,
                        step = plan.step,
                        budget = plan.overlap_budget,
                        candidates = report.candidates,
                        placed = report.placed,
                        remaining = sink.queue.len(),
                        "pass finished"
                    );
                    cancelled = report.cancelled;
                    PassSummary {
                        index,
                        scale,
                        tile_size: plan.size,
                        skipped: false,
                        step: plan.step,
                        overlap_budget: plan.overlap_budget,
                        placed: report.placed,
                    }
                }
            };
            passes.push(summary);
            if cancelled {
                warn!(pass = index, "mosaic generation cancelled");
                break;
            }
            if let Some(progress) = self.progress.as_deref_mut() {
                progress(&PassProgress {
                    pass_index: index,
                    pass_count,
                    summary,
                });
            }
        }

        let unplaced: Vec<String> = sink.queue.iter().map(|p| p.key.clone()).collect();
        let photos_placed = total_photos - unplaced.len();
        info!(photos_placed, total_photos, cancelled, "mosaic generated");
        Ok(PackingOutcome {
            canvas: sink.canvas,
            occupancy,
            placements: sink.placements,
            passes,
            photos_placed,
            total_photos,
            unplaced,
            cancelled,
        })
    }
}

#[instrument(skip_all)]
/// Renders a mosaic with the default Lanczos compositor and a `StdRng` seeded with `seed`.
pub fn generate_mosaic(
    mask: &MaskModel,
    photos: Vec<Photo>,
    cfg: MosaicConfig,
    seed: u64,
) -> Result<PackingOutcome> {
    let compositor = ImageCompositor;
    let mut rng = StdRng::seed_from_u64(seed);
    // bound to a local so the packer drops before `compositor`
    let out = MosaicPacker::new(cfg, &compositor).generate(mask, photos, &mut rng);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_sink_rejects_place_without_photo() {
        let plan = PassPlan::new(0, 1.0, 20, 0, 0, StrideRule::Render).unwrap();
        let mut sink = RenderSink {
            queue: VecDeque::new(),
            canvas: RgbaImage::new(40, 40),
            compositor: &ImageCompositor,
            placements: Vec::new(),
        };
        assert!(!sink.has_supply());
        let err = sink.place(&plan, 0, 0).unwrap_err();
        assert!(matches!(err, MosaicError::InvalidInput(_)));
        assert!(sink.placements.is_empty());
    }
}
