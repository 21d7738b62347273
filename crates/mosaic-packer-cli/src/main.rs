use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, anyhow};
use clap::{ArgAction, Args, Parser, Subcommand};
use globset::{Glob, GlobSetBuilder};
use image::{DynamicImage, ImageFormat, ImageReader};
use indicatif::{ProgressBar, ProgressStyle};
use mosaic_packer_core::compositing::prepare_mask;
use mosaic_packer_core::prelude::*;
use mosaic_packer_core::{ranking_to_json, to_json};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use walkdir::WalkDir;

/// Smallest mask side accepted when resizing.
const MIN_MASK_SIDE: u32 = 100;

#[derive(Parser, Debug)]
#[command(
    name = "mosaic-packer",
    about = "Fill the opaque shape of a logo with a mosaic of photos",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Estimate fill for a grid of tile sizes and overlaps and print the best ones
    Rank(RankArgs),
    /// Render the mosaic to a PNG
    Generate(GenerateArgs),
}

#[derive(Args, Debug, Clone)]
struct InputArgs {
    /// Mask image (PNG with transparency, or a logo on white)
    #[arg(help_heading = "Input/Output")]
    mask: PathBuf,
    /// Photo file or directory
    #[arg(help_heading = "Input/Output")]
    photos: PathBuf,
    /// Include patterns (glob). If set, only photos matching any pattern are used
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Photos matching any pattern are ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,
    /// Resize the mask to this width (at least 100 px)
    #[arg(long, help_heading = "Mask")]
    width: Option<u32>,
    /// Resize the mask to this height (at least 100 px)
    #[arg(long, help_heading = "Mask")]
    height: Option<u32>,
}

#[derive(Args, Debug, Clone)]
struct RankArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Tile sizes to try
    #[arg(long, value_delimiter = ',', default_values_t = [70u32, 90, 110, 130, 150], help_heading = "Search")]
    tile_sizes: Vec<u32>,
    /// Overlap percentages to try
    #[arg(long, value_delimiter = ',', default_values_t = [15u32, 25, 35], help_heading = "Search")]
    overlaps: Vec<u32>,
    /// Number of results to print
    #[arg(long, default_value_t = 5, help_heading = "Search")]
    top: usize,
    /// What a pass does when photos run out: row | pass
    #[arg(long, default_value = "row", help_heading = "Search")]
    policy: String,
    /// Evaluate trials in parallel (requires core feature `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Search")]
    parallel: bool,
    /// Write the ranking as JSON to this file
    #[arg(long, help_heading = "Export")]
    export: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct GenerateArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Output PNG
    #[arg(short, long, default_value = "mosaic.png", help_heading = "Input/Output")]
    out: PathBuf,
    /// YAML config file path (values override flags)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    /// Base tile size in px; omit to use the best ranked setting
    #[arg(long, help_heading = "Layout")]
    tile_size: Option<u32>,
    /// Extra gap between scan origins, in percent (0..=30)
    #[arg(long, default_value_t = 0, help_heading = "Layout")]
    spacing: u32,
    /// Tolerated overlap, in percent of the tile area (0..=50)
    #[arg(long, default_value_t = 25, help_heading = "Layout")]
    overlap: u32,
    /// What a pass does when photos run out: row | pass
    #[arg(long, default_value = "row", help_heading = "Layout")]
    policy: String,
    /// Shuffle seed; random when omitted
    #[arg(long, help_heading = "Layout")]
    seed: Option<u64>,
    /// Rank in parallel when --tile-size is omitted (requires core feature `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    parallel: bool,

    /// Write the placement manifest (JSON) to this file
    #[arg(long, help_heading = "Export")]
    placements: Option<PathBuf>,
    /// Write the occupancy grid as a grayscale PNG to this file
    #[arg(long, help_heading = "Export")]
    occupancy: Option<PathBuf>,
    /// Export mosaic stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: pack and report stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    let show_progress = cli.progress && !cli.quiet;
    match &cli.command {
        Commands::Rank(args) => run_rank(args, show_progress),
        Commands::Generate(args) => run_generate(args, show_progress),
    }
}

fn run_rank(cli: &RankArgs, show_progress: bool) -> anyhow::Result<()> {
    let mask = load_mask(&cli.input.mask, cli.input.width, cli.input.height)?;
    let paths = gather_paths(&cli.input.photos, &cli.input.include, &cli.input.exclude)?;
    if paths.is_empty() {
        anyhow::bail!("no photos found under {}", cli.input.photos.display());
    }
    // the estimate only needs the count, but unreadable files must not be counted
    let photo_count = load_photos_with_progress(&paths, show_progress)?.len();
    info!(photos = photo_count, "loaded photos");

    let cfg = RankerConfig {
        tile_sizes: cli.tile_sizes.clone(),
        overlap_percents: cli.overlaps.clone(),
        top_n: cli.top,
        parallel: cli.parallel,
        exhaustion: parse_policy(&cli.policy)?,
        ..RankerConfig::default()
    };
    let t0 = Instant::now();
    let ranked = rank_configurations(&mask, photo_count, &cfg);
    info!(elapsed_ms = t0.elapsed().as_millis() as u64, "ranking done");

    println!("rank  tile  spacing  overlap  placed  est. fill");
    for (i, r) in ranked.iter().enumerate() {
        println!(
            "{:>4}  {:>4}  {:>6}%  {:>6}%  {:>6}  {:>8.1}%",
            i + 1,
            r.config.tile_size,
            r.config.spacing_percent,
            r.config.overlap_percent,
            r.photos_placed,
            r.display_fill_percent()
        );
    }

    if let Some(path) = &cli.export {
        let json = serde_json::to_string_pretty(&ranking_to_json(&ranked))?;
        fs::write(path, json).with_context(|| format!("write ranking {}", path.display()))?;
        info!(?path, "wrote ranking");
    }
    Ok(())
}

fn run_generate(cli: &GenerateArgs, show_progress: bool) -> anyhow::Result<()> {
    let mut settings = Settings {
        tile_size: cli.tile_size,
        spacing_percent: cli.spacing,
        overlap_percent: cli.overlap,
        exhaustion: parse_policy(&cli.policy)?,
        seed: cli.seed,
        width: cli.input.width,
        height: cli.input.height,
    };
    if let Some(path) = &cli.config {
        let file =
            fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)?;
        settings = y.apply(settings)?;
    }

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&settings)?),
            _ => println!("{}", serde_json::to_string_pretty(&settings)?),
        }
        return Ok(());
    }

    let mask = load_mask(&cli.input.mask, settings.width, settings.height)?;
    let paths = gather_paths(&cli.input.photos, &cli.input.include, &cli.input.exclude)?;
    let photos = load_photos_with_progress(&paths, show_progress)?;
    info!(count = photos.len(), "loaded photos");
    if photos.is_empty() {
        warn!("no photos loaded; the mosaic will be empty");
    }

    let cfg = resolve_config(&settings, &mask, photos.len(), cli.parallel);
    cfg.validate()?;
    let seed = settings.seed.unwrap_or_else(rand::random);
    info!(
        tile_size = cfg.tile_size,
        spacing = cfg.spacing_percent,
        overlap = cfg.overlap_percent,
        seed,
        "generating mosaic"
    );

    let bar = if show_progress {
        let b = ProgressBar::new(mosaic_packer_core::SCALE_CASCADE.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} pass {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let compositor = ImageCompositor;
    let mut rng = StdRng::seed_from_u64(seed);
    let t0 = Instant::now();
    let out = MosaicPacker::new(cfg, &compositor)
        .with_progress(|p| {
            if let Some(b) = &bar {
                b.set_position((p.pass_index + 1) as u64);
                b.set_message(if p.summary.skipped {
                    format!("{}px skipped", p.summary.tile_size)
                } else {
                    format!("{}px placed {}", p.summary.tile_size, p.summary.placed)
                });
            }
        })
        .generate(&mask, photos, &mut rng)?;
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    let stats = out.stats(&mask);
    info!(elapsed_ms = t0.elapsed().as_millis() as u64, "{}", stats.summary());
    if !stats.target_reached {
        warn!(
            coverage = %format!("{:.1}%", stats.canvas_coverage * 100.0),
            "coverage below target; try a smaller tile size or more photos"
        );
    }

    if cli.dry_run {
        info!("dry run: no files written");
        return Ok(());
    }
    if let Some(parent) = cli.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    out.canvas
        .save(&cli.out)
        .with_context(|| format!("write mosaic {}", cli.out.display()))?;
    info!(path = ?cli.out, "wrote mosaic");
    if let Some(path) = &cli.placements {
        let json = serde_json::to_string_pretty(&to_json(&out, &stats))?;
        fs::write(path, json).with_context(|| format!("write placements {}", path.display()))?;
    }
    if let Some(path) = &cli.occupancy {
        out.occupancy
            .to_luma()
            .save(path)
            .with_context(|| format!("write occupancy {}", path.display()))?;
    }
    if let Some(path) = &cli.export_stats {
        let json = serde_json::to_string_pretty(&stats)?;
        fs::write(path, json).with_context(|| format!("write stats {}", path.display()))?;
    }
    Ok(())
}

/// Uses the explicit tile size when given, otherwise the best ranked setting.
fn resolve_config(
    settings: &Settings,
    mask: &MaskModel,
    photo_count: usize,
    parallel: bool,
) -> MosaicConfig {
    let base = MosaicConfig::builder()
        .spacing_percent(settings.spacing_percent)
        .overlap_percent(settings.overlap_percent)
        .exhaustion(settings.exhaustion);
    if let Some(tile_size) = settings.tile_size {
        return base.tile_size(tile_size).build();
    }
    let ranker = RankerConfig {
        spacing_percent: settings.spacing_percent,
        top_n: 1,
        parallel,
        exhaustion: settings.exhaustion,
        ..RankerConfig::default()
    };
    match rank_configurations(mask, photo_count, &ranker).first() {
        Some(best) => {
            info!(
                tile_size = best.config.tile_size,
                overlap = best.config.overlap_percent,
                est_fill = best.display_fill_percent(),
                "using best ranked setting"
            );
            best.config
        }
        None => base.build(),
    }
}

fn parse_policy(s: &str) -> anyhow::Result<ExhaustionPolicy> {
    s.parse()
        .map_err(|_| anyhow!("unknown policy '{s}' (expected row|pass)"))
}

fn load_mask(path: &Path, width: Option<u32>, height: Option<u32>) -> anyhow::Result<MaskModel> {
    let reader = ImageReader::open(path)
        .with_context(|| format!("open mask {}", path.display()))?
        .with_guessed_format()?;
    let white_is_background = reader.format() == Some(ImageFormat::Jpeg);
    let img = reader.decode()?;
    let size = if width.is_some() || height.is_some() {
        let w = width.unwrap_or(img.width());
        let h = height.unwrap_or(img.height());
        if w < MIN_MASK_SIDE || h < MIN_MASK_SIDE {
            anyhow::bail!("mask size {w}x{h} is below the {MIN_MASK_SIDE}px minimum");
        }
        Some((w, h))
    } else {
        None
    };
    let rgba = prepare_mask(&img, size, white_is_background)?;
    let mask = MaskModel::from_rgba(&rgba)?;
    info!(
        width = mask.width(),
        height = mask.height(),
        opaque = mask.total_opaque_pixels(),
        "loaded mask"
    );
    Ok(mask)
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    // Build glob matchers
    let mut inc_set = None;
    if !include.is_empty() {
        let mut b = GlobSetBuilder::new();
        for pat in include {
            b.add(Glob::new(pat)?);
        }
        inc_set = Some(b.build()?);
    }
    let mut exc_set = None;
    if !exclude.is_empty() {
        let mut b = GlobSetBuilder::new();
        for pat in exclude {
            b.add(Glob::new(pat)?);
        }
        exc_set = Some(b.build()?);
    }
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn should_skip(
    p: &Path,
    include: Option<&globset::GlobSet>,
    exclude: Option<&globset::GlobSet>,
) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if exclude.is_some_and(|ex| ex.is_match(&s)) {
        return true;
    }
    include.is_some_and(|inc| !inc.is_match(&s))
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg")
    )
}

fn load_photos_with_progress(paths: &[PathBuf], progress: bool) -> anyhow::Result<Vec<Photo>> {
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match load_image(p) {
            Ok(img) => {
                let key = p.to_string_lossy().replace('\\', "/");
                list.push(Photo::from_dynamic(key, &img));
            }
            Err(e) => {
                error!(?p, error = %e, "skip photo");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn load_image(p: &Path) -> anyhow::Result<DynamicImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img)
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

/// Generate settings after merging flags and the YAML file.
#[derive(Debug, Serialize)]
struct Settings {
    tile_size: Option<u32>,
    spacing_percent: u32,
    overlap_percent: u32,
    exhaustion: ExhaustionPolicy,
    seed: Option<u64>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    tile_size: Option<u32>,
    spacing_percent: Option<u32>,
    overlap_percent: Option<u32>,
    exhaustion: Option<String>,
    seed: Option<u64>,
    width: Option<u32>,
    height: Option<u32>,
}

impl YamlConfig {
    fn apply(self, mut s: Settings) -> anyhow::Result<Settings> {
        if let Some(v) = self.tile_size {
            s.tile_size = Some(v);
        }
        if let Some(v) = self.spacing_percent {
            s.spacing_percent = v;
        }
        if let Some(v) = self.overlap_percent {
            s.overlap_percent = v;
        }
        if let Some(v) = self.exhaustion {
            s.exhaustion = parse_policy(&v)?;
        }
        if let Some(v) = self.seed {
            s.seed = Some(v);
        }
        if let Some(v) = self.width {
            s.width = Some(v);
        }
        if let Some(v) = self.height {
            s.height = Some(v);
        }
        Ok(s)
    }
}
