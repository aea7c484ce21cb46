//! # Strata Command Line Tool
//!
//! Generates a grid (or a stitched stack of levels), validates it and prints
//! it as ASCII or JSON.

use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use strata::{render_ascii, render_levels, GenerationParams, GeneratorKind, Grid, MultiLevelGenerator, StrataResult};

/// Command line arguments for the Strata generator.
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(about = "Deterministic procedural terrain and dungeon generation")]
#[command(version)]
struct Args {
    /// Generator: bsp, cellular, maze, forest, city or composite
    #[arg(short, long, default_value = "bsp")]
    algorithm: String,

    /// Map width in tiles
    #[arg(long)]
    width: Option<i64>,

    /// Map height in tiles
    #[arg(long)]
    height: Option<i64>,

    /// Random seed for generation
    #[arg(short, long, default_value_t = 12345)]
    seed: i64,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Genre identifier (fantasy, scifi, horror, cyberpunk, postapoc)
    #[arg(short, long)]
    genre: Option<String>,

    /// Difficulty in [0, 1]
    #[arg(long)]
    difficulty: Option<f64>,

    /// Dungeon depth of the generated level
    #[arg(long)]
    depth: Option<u32>,

    /// Generate this many stitched levels
    #[arg(long)]
    levels: Option<usize>,

    /// JSON file holding generation parameters; flags override its values
    #[arg(long)]
    params: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Ascii)]
    format: Format,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Ascii,
    Json,
}

fn main() -> StrataResult<()> {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    log::info!("strata v{}", strata::VERSION);
    run(&args).map_err(|err| {
        log::error!("{err}");
        err
    })
}

/// Initializes the logging system; `RUST_LOG` takes precedence over the flag.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        use tracing::level_filters::LevelFilter;
        use tracing::Level;
        use tracing_subscriber::EnvFilter;

        let level = match log_level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
            .format_target(false)
            .init();
    }
}

fn run(args: &Args) -> StrataResult<()> {
    let kind: GeneratorKind = args.algorithm.parse()?;
    let params = build_params(args)?;

    let output = match args.levels {
        Some(count) => {
            let stitcher = (0..count).fold(MultiLevelGenerator::new(), |stitcher, depth| {
                stitcher.with_generator(depth, kind)
            });
            let levels = stitcher.generate(count, args.seed, &params)?;
            for grid in &levels {
                kind.validate(grid)?;
            }
            stitcher.validate(&levels)?;
            log::info!("generated {} levels with {kind} (seed {})", levels.len(), args.seed);
            match args.format {
                Format::Ascii => render_levels(&levels),
                Format::Json => serde_json::to_string_pretty(&levels)?,
            }
        }
        None => {
            let grid = kind.generate(args.seed, &params)?;
            kind.validate(&grid)?;
            log::info!("{}", summary(&grid));
            match args.format {
                Format::Ascii => render_ascii(&grid),
                Format::Json => serde_json::to_string_pretty(&grid)?,
            }
        }
    };

    match &args.output {
        Some(path) => write_output(path, &output),
        None => {
            print!("{output}");
            Ok(())
        }
    }
}

/// Loads the parameter file, if any, then applies command-line overrides.
fn build_params(args: &Args) -> StrataResult<GenerationParams> {
    let mut params = match &args.params {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => GenerationParams::default(),
    };
    if let Some(genre) = &args.genre {
        params.genre = genre.clone();
    }
    if let Some(difficulty) = args.difficulty {
        params.difficulty = difficulty;
    }
    if let Some(depth) = args.depth {
        params.depth = depth;
    }
    if args.width.is_some() {
        params.custom.width = args.width;
    }
    if args.height.is_some() {
        params.custom.height = args.height;
    }
    Ok(params)
}

fn summary(grid: &Grid) -> String {
    format!(
        "{} {}x{}: {} rooms, {:.1}% walkable, {} water features (seed {})",
        grid.generator,
        grid.width(),
        grid.height(),
        grid.rooms.len(),
        grid.walkable_ratio() * 100.0,
        grid.water_features.len(),
        grid.seed
    )
}

fn write_output(path: &Path, output: &str) -> StrataResult<()> {
    fs::write(path, output)?;
    log::info!("wrote {}", path.display());
    Ok(())
}
