use crate::config::RankerConfig;
use crate::mask::MaskModel;
use crate::model::SimulationResult;
use crate::packer::simulation::simulate;
use std::time::Instant;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Ranks the default candidate grid for `photo_count` photos: tile sizes
/// {70, 90, 110, 130, 150} × overlap {15, 25, 35}, spacing 0, best five first.
pub fn rank(mask: &MaskModel, photo_count: usize) -> Vec<SimulationResult> {
    rank_configurations(mask, photo_count, &RankerConfig::default())
}

#[instrument(skip_all, fields(photo_count = photo_count))]
/// Simulates every candidate of `cfg` and returns the best `cfg.top_n` by fill ratio.
///
/// Notes:
/// - Sorting is stable and uses the uncapped ratio, so ties keep search order.
/// - With the "parallel" feature and `cfg.parallel`, trials run on the rayon pool;
///   each owns its occupancy grid and only reads the shared mask.
pub fn rank_configurations(
    mask: &MaskModel,
    photo_count: usize,
    cfg: &RankerConfig,
) -> Vec<SimulationResult> {
    let results = simulate_all(mask, photo_count, cfg);
    let mut ranked = sort_by_fill(results);
    ranked.truncate(cfg.top_n);
    ranked
}

/// Simulates every candidate of `cfg`, in search order, without sorting.
pub fn simulate_all(
    mask: &MaskModel,
    photo_count: usize,
    cfg: &RankerConfig,
) -> Vec<SimulationResult> {
    let candidates = cfg.candidates();
    let start = Instant::now();

    #[cfg(feature = "parallel")]
    {
        if cfg.parallel {
            let results: Vec<SimulationResult> = candidates
                .par_iter()
                .map(|cand| simulate(mask, photo_count, cand))
                .collect();
            info!(
                trials = results.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "simulated candidates (parallel)"
            );
            return results;
        }
    }

    let results: Vec<SimulationResult> = candidates
        .iter()
        .map(|cand| simulate(mask, photo_count, cand))
        .collect();
    info!(
        trials = results.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "simulated candidates"
    );
    results
}

/// Stable sort, highest fill ratio first.
pub fn sort_by_fill(mut results: Vec<SimulationResult>) -> Vec<SimulationResult> {
    results.sort_by(|a, b| b.fill_ratio.total_cmp(&a.fill_ratio));
    results
}
