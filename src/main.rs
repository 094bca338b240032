use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tile_sketch::config::{parse_bounds, PipelineConfig, TilingPlan};
use tile_sketch::distort::SketchStyle;
use tile_sketch::export::TileWriter;
use tile_sketch::pipeline::{process_parallel, slice, RunStats};
use tile_sketch::source::{tile_stream, GeoJsonSource, ObjectSource};

#[derive(Parser, Debug)]
#[command(name = "tile_sketch")]
#[command(about = "Cut map objects into tiles and write augmented, hand-drawn variants")]
struct Args {
    /// GeoJSON FeatureCollection with the source objects
    input: PathBuf,

    /// Directory the tiles are written to
    target: PathBuf,

    /// Tile side length in kilometers (default: 1.0)
    #[arg(short = 'k', long)]
    tile_size_km: Option<f64>,

    /// Area to tile as lon,lat,lon,lat (default: extent of the input)
    #[arg(short, long, allow_hyphen_values = true)]
    bounds: Option<String>,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Give every variant a hand-drawn outline
    #[arg(long)]
    sketch: bool,

    /// Sketch style preset
    #[arg(long, value_enum)]
    style: Option<SketchStyle>,

    /// Fit every output tile into 0..EXTENT on both axes
    #[arg(short, long, value_name = "EXTENT")]
    normalize: Option<f64>,

    /// Also write each sliced source tile next to its variants
    #[arg(long)]
    write_sliced: bool,

    /// JSON config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log per-tile detail
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(stats) => {
            info!(
                tiles_in = stats.tiles_in,
                tiles_out = stats.tiles_out,
                failed_tiles = stats.failed_tiles,
                failed_writes = stats.failed_writes,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tile_sketch=debug"
    } else {
        "tile_sketch=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Config file values, overridden by whatever flags were given.
fn build_config(args: &Args) -> Result<PipelineConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(km) = args.tile_size_km {
        config.tile_size_km = km;
    }
    if let Some(text) = &args.bounds {
        config.bounds = Some(parse_bounds(text)?);
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.sketch {
        config.sketch = true;
    }
    if let Some(style) = args.style {
        config.style = style;
        config.distort = None;
    }
    if args.normalize.is_some() {
        config.normalize_extent = args.normalize;
    }

    Ok(config)
}

fn run(args: &Args) -> Result<RunStats, Box<dyn Error>> {
    let config = build_config(args)?;
    let options = config.process_options()?;

    let source = GeoJsonSource::load(&args.input)?;
    let plan = TilingPlan::resolve(&config, source.extent())?;
    info!(
        zoom = plan.zoom,
        range = %plan.range,
        tiles = plan.range.tile_count(),
        sketch = config.sketch,
        style = %config.style,
        "tiling plan"
    );
    info!(seeds = %options.seeds, "seeds");

    let writer = TileWriter::new(&args.target);

    let fetched = tile_stream(&source, plan.range).filter_map(|result| match result {
        Ok(tile) => Some(tile),
        Err(err) => {
            warn!(error = %err, "skipping tile");
            None
        }
    });
    let sliced = slice(fetched).filter(|tile| !tile.is_empty()).inspect(|tile| {
        if args.write_sliced {
            if let Err(err) = writer.write(tile) {
                warn!(tile = %tile.coord, error = %err, "write failed");
            }
        }
    });

    Ok(process_parallel(sliced, &options, |tile| {
        writer.write(tile).map(|_| ())
    }))
}
