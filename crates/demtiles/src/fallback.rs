//! Secondary elevation source consulted when the primary has no coverage.

use crate::{RasterHandle, Result, TileCoord};

/// Datasource queried for tiles the remote index does not cover.
///
/// Consulted on every negative-cache outcome, both a fresh `NotCovered`
/// answer and a pre-existing absent marker. Implementations may be other
/// tile archives, local directories, or nothing at all ([`NoFallback`]).
pub trait FallbackSource {
    /// Produce a raster for the tile, or `None` if this source has no
    /// coverage either.
    fn fetch(&self, coord: TileCoord) -> Result<Option<RasterHandle>>;
}

/// Fallback that never supplies data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFallback;

impl FallbackSource for NoFallback {
    fn fetch(&self, _coord: TileCoord) -> Result<Option<RasterHandle>> {
        Ok(None)
    }
}
