//! Minimal access to SRTM HGT rasters.
//!
//! An HGT file is a square grid of big-endian `i16` elevation samples in
//! meters, row-major from the northwest corner, covering the 1x1 degree
//! cell named by the file (the edge rows/columns are shared with the
//! neighbouring tiles). SRTM1 tiles are 3601x3601 samples, SRTM3 tiles
//! 1201x1201; any square grid is accepted here since only the geometry
//! matters.

use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::{DemError, Result, TileCoord};

/// Sample value marking missing data in SRTM rasters.
pub const HGT_VOID: i16 = -32768;

/// Handle to a cached elevation raster.
///
/// Opening validates the file's shape; samples are read on demand, so
/// handles stay cheap even when a range resolution returns many of them.
#[derive(Debug, Clone)]
pub struct RasterHandle {
    path: PathBuf,
    side: u32,
    sw_corner: Option<TileCoord>,
}

impl RasterHandle {
    /// Open and validate a raster file.
    ///
    /// Fails if the file is not a whole square grid of 16-bit samples.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let len = fs::metadata(&path)?.len();
        let side = hgt_side(len).ok_or_else(|| DemError::Raster {
            path: path.clone(),
            reason: format!("{len} bytes is not a square grid of 16-bit samples"),
        })?;
        let sw_corner = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(TileCoord::from_name);
        Ok(Self {
            path,
            side,
            sw_corner,
        })
    }

    /// Path of the underlying raster file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of samples along one edge of the grid.
    pub fn samples_per_side(&self) -> u32 {
        self.side
    }

    /// Tile coordinate encoded in the filename, if it parses.
    pub fn tile(&self) -> Option<TileCoord> {
        self.sw_corner
    }

    /// Elevation in meters at a coordinate, nearest-neighbour sampled.
    ///
    /// Returns `None` where the raster records a void. Errors if the
    /// filename does not encode a tile coordinate or the coordinate falls
    /// outside the tile.
    pub fn elevation(&self, lat: f64, lon: f64) -> Result<Option<f32>> {
        let sw = self.sw_corner.ok_or_else(|| DemError::Raster {
            path: self.path.clone(),
            reason: "filename does not encode a tile coordinate".to_string(),
        })?;

        let (min_lat, min_lon) = (sw.lat as f64, sw.lon as f64);
        if lat < min_lat || lat > min_lat + 1.0 || lon < min_lon || lon > min_lon + 1.0 {
            return Err(DemError::OutOfBounds { lat, lon });
        }

        // Row 0 is the north edge; spacing is 1/(side-1) degrees
        let steps = (self.side - 1) as f64;
        let row = ((min_lat + 1.0 - lat) * steps).round() as u64;
        let col = ((lon - min_lon) * steps).round() as u64;
        let row = row.min(self.side as u64 - 1);
        let col = col.min(self.side as u64 - 1);

        let sample = self.read_sample(row, col)?;
        if sample == HGT_VOID {
            Ok(None)
        } else {
            Ok(Some(sample as f32))
        }
    }

    fn read_sample(&self, row: u64, col: u64) -> Result<i16> {
        let mut file = fs::File::open(&self.path)?;
        file.seek(SeekFrom::Start((row * self.side as u64 + col) * 2))?;
        let mut buf = [0u8; 2];
        file.read_exact(&mut buf)?;
        Ok(i16::from_be_bytes(buf))
    }
}

/// Edge length of a square 16-bit grid of `len` bytes, if it is one.
fn hgt_side(len: u64) -> Option<u32> {
    if len == 0 || len % 2 != 0 {
        return None;
    }
    let samples = len / 2;
    let side = (samples as f64).sqrt().round() as u64;
    (side >= 2 && side * side == samples).then_some(side as u32)
}
