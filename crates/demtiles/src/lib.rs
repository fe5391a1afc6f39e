//! # demtiles
//!
//! Elevation tile resolver for archive-backed remote indexes with a
//! sharded local cache.
//!
//! The remote source packages many SRTM-style `.hgt` tiles together in
//! zip archives and exposes discovery through an index that answers with
//! redirect headers: `Location` points at the archive, `X-Zip-Path` names
//! the requested member inside it. This crate turns that protocol into a
//! simple "give me the raster for this coordinate" call:
//!
//! - a cache hit (or a cached "not covered" marker) is answered from disk
//!   with no network I/O;
//! - a miss performs the two-stage HTTP exchange, extracts the archive,
//!   and disperses *every* contained tile into its own cache location, so
//!   sibling tiles resolve for free afterwards;
//! - tiles the remote does not cover are recorded with a `.404` sentinel
//!   and routed to a pluggable fallback datasource.
//!
//! Cache locations are derived from each tile's canonical URL: the first
//! three hex characters of the URL's SHA-256 digest pick a shard
//! directory, bounding directory fan-out. All cache writes are idempotent
//! so independent processes can share one cache tree without locks.
//!
//! ## Examples
//!
//! ### Resolving a single tile
//!
//! ```no_run
//! use demtiles::{ResolverConfig, TileCoord, TileResolver};
//!
//! let config = ResolverConfig::default();
//! let resolver = TileResolver::new(&config)?;
//!
//! if let Some(raster) = resolver.resolve_tile(TileCoord::new(46, 7))? {
//!     println!("tile cached at {}", raster.path().display());
//!     if let Some(elevation) = raster.elevation(46.5, 7.5)? {
//!         println!("elevation: {} meters", elevation);
//!     }
//! }
//! # Ok::<(), demtiles::DemError>(())
//! ```
//!
//! ### Resolving a bounding box
//!
//! ```no_run
//! use demtiles::{ResolverConfig, TileResolver};
//!
//! let resolver = TileResolver::new(&ResolverConfig::default())?;
//!
//! // Tiles with no coverage are skipped, not errors
//! let rasters = resolver.resolve_range(6.5, 45.5, 8.5, 46.5);
//! println!("resolved {} tiles", rasters.len());
//! # Ok::<(), demtiles::DemError>(())
//! ```

mod archive;
mod cache;
mod config;
mod coverage;
mod error;
mod fallback;
mod locator;
mod raster;
mod remote;
mod resolver;

pub use cache::CacheEntry;
pub use config::ResolverConfig;
pub use coverage::tiles_covering;
pub use error::DemError;
pub use fallback::{FallbackSource, NoFallback};
pub use locator::{TileCoord, TileLocation, TileLocator, DEFAULT_INDEX_URL, RASTER_EXT};
pub use raster::{RasterHandle, HGT_VOID};
pub use remote::{HttpIndex, RemoteIndex, RemoteLookup};
pub use resolver::TileResolver;

/// Result type for tile resolution.
pub type Result<T> = std::result::Result<T, DemError>;
