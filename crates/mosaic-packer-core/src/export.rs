use crate::model::{MosaicStats, SimulationResult};
use crate::packer::mosaic::PackingOutcome;
use serde_json::{Value, json};

/// Placement manifest of a finished run: `{ width, height, placements, passes, unplaced, stats }`.
pub fn to_json(outcome: &PackingOutcome, stats: &MosaicStats) -> Value {
    let placements: Vec<Value> = outcome
        .placements
        .iter()
        .map(|p| {
            json!({
                "key": p.key,
                "frame": {"x": p.x, "y": p.y, "w": p.size, "h": p.size},
                "pass": p.pass,
            })
        })
        .collect();
    json!({
        "width": outcome.canvas.width(),
        "height": outcome.canvas.height(),
        "placements": placements,
        "passes": &outcome.passes,
        "unplaced": &outcome.unplaced,
        "stats": stats,
    })
}

/// Ranking table as JSON rows; `estimatedFillPercent` is the capped display value.
pub fn ranking_to_json(results: &[SimulationResult]) -> Value {
    let rows: Vec<Value> = results
        .iter()
        .map(|r| {
            json!({
                "tileSize": r.config.tile_size,
                "spacingPercent": r.config.spacing_percent,
                "overlapPercent": r.config.overlap_percent,
                "photosPlaced": r.photos_placed,
                "fillRatio": r.fill_ratio,
                "estimatedFillPercent": r.display_fill_percent(),
            })
        })
        .collect();
    Value::Array(rows)
}
