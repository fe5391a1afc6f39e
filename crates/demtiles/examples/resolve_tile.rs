//! Example: resolve one elevation tile and sample its elevation.
//!
//! Usage: cargo run --example resolve_tile -- <lat> <lon> [cache_dir]

use demtiles::{ResolverConfig, TileCoord, TileResolver};
use std::env;
use std::time::Instant;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <lat> <lon> [cache_dir]", args[0]);
        eprintln!("Example: {} 46.5 7.5 ./elevation_cache", args[0]);
        std::process::exit(1);
    }

    let lat: f64 = args[1].parse().expect("Invalid latitude");
    let lon: f64 = args[2].parse().expect("Invalid longitude");

    let mut config = ResolverConfig::default();
    if let Some(dir) = args.get(3) {
        config.cache_root = dir.into();
    }

    let resolver = TileResolver::new(&config).expect("Failed to build resolver");
    let coord = TileCoord::from_position(lat, lon);

    println!("Resolving tile {} into {}...", coord, config.cache_root.display());
    let start = Instant::now();

    match resolver.resolve_tile(coord) {
        Ok(Some(raster)) => {
            println!(
                "Resolved to {} in {:.2}s",
                raster.path().display(),
                start.elapsed().as_secs_f64()
            );
            match raster.elevation(lat, lon) {
                Ok(Some(elevation)) => println!("Elevation: {:.1} meters", elevation),
                Ok(None) => println!("Elevation: void (no data at this point)"),
                Err(e) => eprintln!("Sampling failed: {}", e),
            }
        }
        Ok(None) => {
            println!("No coverage for {} (and no fallback configured)", coord);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    // A second resolution is answered from the cache
    let start = Instant::now();
    if resolver.resolve_tile(coord).is_ok() {
        println!("Re-resolved from cache in {:.6}s", start.elapsed().as_secs_f64());
    }
}
