//! Tile naming and cache location math.
//!
//! Elevation tiles are 1x1 degree cells named by their southwest corner in
//! the SRTM convention: `N46E007` covers latitude 46°N..47°N and longitude
//! 7°E..8°E, `S09W077` covers 9°S..8°S and 77°W..76°W.
//!
//! The remote index is addressed by substituting the tile name into a fixed
//! URL, and the local cache location is derived from that URL: the first
//! three hex characters of its SHA-256 digest pick a shard directory, which
//! bounds the number of files per directory no matter how many tiles are
//! cached. The same derivation applies to tiles discovered inside a
//! downloaded archive, keyed by their base filename instead of a coordinate.

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

/// Index URL the canonical tile names are resolved against by default.
pub const DEFAULT_INDEX_URL: &str = "http://brillo.stamen.com/elevation/viewfinder-dems/index";

/// File extension of the elevation rasters served by the index.
pub const RASTER_EXT: &str = "hgt";

/// Number of hex characters of the URL digest used as the shard name.
const SHARD_LEN: usize = 3;

/// Integer degree coordinates of one elevation tile (southwest corner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Latitude of the southwest corner in degrees (positive = north).
    pub lat: i32,
    /// Longitude of the southwest corner in degrees (positive = east).
    pub lon: i32,
}

impl TileCoord {
    /// Create a tile coordinate from integer degrees.
    pub fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    /// Tile containing an arbitrary geographic position.
    pub fn from_position(lat: f64, lon: f64) -> Self {
        Self {
            lat: lat.floor() as i32,
            lon: lon.floor() as i32,
        }
    }

    /// Canonical SRTM tile name, e.g. `N46E007` or `S09W077`.
    pub fn name(&self) -> String {
        format!(
            "{}{:02}{}{:03}",
            if self.lat >= 0 { 'N' } else { 'S' },
            self.lat.abs(),
            if self.lon >= 0 { 'E' } else { 'W' },
            self.lon.abs()
        )
    }

    /// Parse a canonical tile name back into a coordinate.
    ///
    /// Accepts exactly the format produced by [`TileCoord::name`]; returns
    /// `None` for anything else.
    pub fn from_name(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        if bytes.len() != 7 {
            return None;
        }
        let lat_sign = match bytes[0] {
            b'N' => 1,
            b'S' => -1,
            _ => return None,
        };
        let lon_sign = match bytes[3] {
            b'E' => 1,
            b'W' => -1,
            _ => return None,
        };
        let lat: i32 = name[1..3].parse().ok()?;
        let lon: i32 = name[4..7].parse().ok()?;
        Some(Self {
            lat: lat_sign * lat,
            lon: lon_sign * lon,
        })
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Resolved locations for one tile: where it lives remotely and locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLocation {
    /// Canonical remote URL of the tile's index entry.
    pub url: String,
    /// Final path of the raster file in the local cache.
    pub cache_path: PathBuf,
    /// Shard directory containing `cache_path`.
    pub cache_dir: PathBuf,
}

/// Maps tile coordinates (or archive member names) to remote URLs and
/// cache paths.
///
/// Pure and deterministic: the same input always produces the same
/// locations, which is what keeps concurrent resolutions of the same tile
/// harmless. They all write to the same place.
#[derive(Debug, Clone)]
pub struct TileLocator {
    index_url: String,
    cache_root: PathBuf,
    raster_ext: String,
}

impl TileLocator {
    /// Create a locator for the given index URL and cache root.
    pub fn new<S: Into<String>, P: Into<PathBuf>>(index_url: S, cache_root: P) -> Self {
        let mut index_url = index_url.into();
        while index_url.ends_with('/') {
            index_url.pop();
        }
        Self {
            index_url,
            cache_root: cache_root.into(),
            raster_ext: RASTER_EXT.to_string(),
        }
    }

    /// Root directory of the local cache tree.
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// File extension of qualifying rasters, without the dot.
    pub fn raster_ext(&self) -> &str {
        &self.raster_ext
    }

    /// Locate a tile by coordinate.
    pub fn locate(&self, coord: TileCoord) -> TileLocation {
        self.locate_name(&coord.name())
    }

    /// Locate a tile by its base name.
    ///
    /// Used both for coordinate-derived names and for archive members
    /// discovered after extraction, whose filename stem stands in for the
    /// coordinate.
    pub fn locate_name(&self, stem: &str) -> TileLocation {
        let filename = format!("{}.{}", stem, self.raster_ext);
        let url = format!("{}/{}", self.index_url, filename);
        let cache_dir = self.cache_root.join(shard_name(&url));
        let cache_path = cache_dir.join(filename);
        TileLocation {
            url,
            cache_path,
            cache_dir,
        }
    }
}

/// Shard directory name for a canonical URL.
fn shard_name(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut hex = format!("{:02x}{:02x}", digest[0], digest[1]);
    hex.truncate(SHARD_LEN);
    hex
}
