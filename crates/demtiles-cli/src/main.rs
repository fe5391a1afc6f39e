//! demtiles command line interface.
//!
//! Resolves elevation tiles into the local cache: a single tile by
//! coordinate, every tile covering a bounding box, or a no-network look
//! at what the cache already knows.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use demtiles::{CacheEntry, ResolverConfig, TileCoord, TileResolver};

#[derive(Parser, Debug)]
#[command(name = "demtiles")]
#[command(about = "Resolve elevation tiles from an archive-backed remote index")]
struct Cli {
    /// YAML configuration file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cache directory, overriding the configuration
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Log filter, e.g. "info" or "demtiles=debug"
    #[arg(long, default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the tile containing a coordinate and sample its elevation
    Tile {
        /// Latitude in decimal degrees (positive = north)
        lat: f64,
        /// Longitude in decimal degrees (positive = east)
        lon: f64,
    },
    /// Resolve every tile covering a bounding box
    Range {
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    },
    /// Show a tile's cache state without touching the network
    Status {
        lat: f64,
        lon: f64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config: ResolverConfig = match &cli.config {
        Some(path) => serde_yaml::from_str(&fs::read_to_string(path)?)?,
        None => ResolverConfig::default(),
    };
    if let Some(dir) = cli.cache_dir {
        config.cache_root = dir;
    }

    let resolver = TileResolver::new(&config)?;

    match cli.command {
        Command::Tile { lat, lon } => {
            let coord = TileCoord::from_position(lat, lon);
            match resolver.resolve_tile(coord)? {
                Some(raster) => {
                    println!("{} -> {}", coord, raster.path().display());
                    match raster.elevation(lat, lon)? {
                        Some(elevation) => {
                            println!("elevation at ({lat}, {lon}): {elevation:.1} m")
                        }
                        None => println!("elevation at ({lat}, {lon}): void"),
                    }
                }
                None => println!("{coord}: no coverage"),
            }
        }
        Command::Range {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        } => {
            let handles = resolver.resolve_range(min_lon, min_lat, max_lon, max_lat);
            for handle in &handles {
                println!("{}", handle.path().display());
            }
            println!("resolved {} tiles", handles.len());
        }
        Command::Status { lat, lon } => {
            let coord = TileCoord::from_position(lat, lon);
            match resolver.cache_entry(coord) {
                CacheEntry::Present(path) => println!("{coord}: cached at {}", path.display()),
                CacheEntry::Absent => println!("{coord}: known not covered"),
                CacheEntry::Unknown => println!("{coord}: not resolved yet"),
            }
        }
    }
    Ok(())
}
