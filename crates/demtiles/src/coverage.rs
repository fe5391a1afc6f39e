//! Enumeration of the 1x1 degree tiles covering a bounding box.

use crate::TileCoord;

/// Tile coordinates whose cells intersect the given box.
///
/// Cells are enumerated south-to-north, west-to-east. A degenerate box
/// (a point, or a span inside one cell) yields the single containing
/// tile; an inverted box yields nothing.
pub fn tiles_covering(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Vec<TileCoord> {
    if max_lon < min_lon || max_lat < min_lat {
        return Vec::new();
    }

    let lat_lo = min_lat.floor() as i32;
    let lat_hi = (max_lat.ceil() as i32).max(lat_lo + 1);
    let lon_lo = min_lon.floor() as i32;
    let lon_hi = (max_lon.ceil() as i32).max(lon_lo + 1);

    let mut tiles = Vec::with_capacity(((lat_hi - lat_lo) * (lon_hi - lon_lo)) as usize);
    for lat in lat_lo..lat_hi {
        for lon in lon_lo..lon_hi {
            tiles.push(TileCoord::new(lat, lon));
        }
    }
    tiles
}
