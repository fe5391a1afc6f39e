//! Single-tile and bounding-box resolution.
//!
//! The resolver wires the pipeline together: cache lookup first, then the
//! two-stage remote exchange, then archive dispersal, then a re-read of
//! the cache. Negative answers are cached as absent markers and routed to
//! the fallback datasource.

use tracing::{info, warn};

use crate::archive;
use crate::cache::{self, CacheEntry};
use crate::config::ResolverConfig;
use crate::coverage;
use crate::fallback::{FallbackSource, NoFallback};
use crate::locator::{TileCoord, TileLocator};
use crate::remote::{HttpIndex, RemoteIndex, RemoteLookup};
use crate::{DemError, RasterHandle, Result};

/// Resolves elevation tiles through the cache, the remote index, and the
/// fallback datasource.
///
/// Generic over its collaborators so tests and embedders can substitute
/// scripted implementations; the defaults are the production HTTP index
/// and no fallback. The resolver is `Send + Sync` when its collaborators
/// are: tiles are independent, and the cache tree tolerates concurrent
/// writers by idempotence rather than locking.
#[derive(Debug)]
pub struct TileResolver<R = HttpIndex, F = NoFallback> {
    locator: TileLocator,
    remote: R,
    fallback: F,
}

impl TileResolver<HttpIndex, NoFallback> {
    /// Build a resolver from configuration, with no fallback datasource.
    pub fn new(config: &ResolverConfig) -> Result<Self> {
        Ok(Self {
            locator: TileLocator::new(config.index_url.clone(), config.cache_root.clone()),
            remote: HttpIndex::new(config.timeout())?,
            fallback: NoFallback,
        })
    }
}

impl<R: RemoteIndex, F: FallbackSource> TileResolver<R, F> {
    /// Assemble a resolver from explicit collaborators.
    pub fn with_parts(locator: TileLocator, remote: R, fallback: F) -> Self {
        Self {
            locator,
            remote,
            fallback,
        }
    }

    /// Replace the fallback datasource.
    pub fn with_fallback<G: FallbackSource>(self, fallback: G) -> TileResolver<R, G> {
        TileResolver {
            locator: self.locator,
            remote: self.remote,
            fallback,
        }
    }

    /// The locator this resolver derives URLs and cache paths from.
    pub fn locator(&self) -> &TileLocator {
        &self.locator
    }

    /// Current cache state of a tile, without touching the network.
    pub fn cache_entry(&self, coord: TileCoord) -> CacheEntry {
        cache::lookup(&self.locator.locate(coord).cache_path)
    }

    /// Resolve one tile.
    ///
    /// Returns `Ok(None)` when neither the remote source nor the fallback
    /// covers the tile. Transport, protocol, archive, and filesystem
    /// failures are errors for this tile only; nothing is retried
    /// internally.
    pub fn resolve_tile(&self, coord: TileCoord) -> Result<Option<RasterHandle>> {
        let location = self.locator.locate(coord);

        match cache::lookup(&location.cache_path) {
            CacheEntry::Present(path) => return cache::open(&path).map(Some),
            CacheEntry::Absent => return self.fallback.fetch(coord),
            CacheEntry::Unknown => {}
        }

        info!(tile = %coord, url = %location.url, "retrieving tile from remote index");
        match self.remote.resolve_index(&location.url)? {
            RemoteLookup::NotCovered => {
                cache::write_absent_marker(&location.cache_path, &location.url)?;
                self.fallback.fetch(coord)
            }
            RemoteLookup::Redirect {
                archive_url,
                member_path,
            } => {
                info!(tile = %coord, %archive_url, %member_path, "index redirected to archive");
                let bytes = self.remote.fetch_archive(&archive_url)?;
                let handle = archive::disperse(
                    &self.locator,
                    &archive_url,
                    &member_path,
                    &bytes,
                    &location.cache_path,
                )?;
                Ok(Some(handle))
            }
            RemoteLookup::Error { status, body } => Err(DemError::RemoteStatus {
                url: location.url,
                status,
                body,
            }),
        }
    }

    /// Resolve every tile covering a bounding box.
    ///
    /// Tiles are independent: one tile's failure (logged) or lack of
    /// coverage (silent) never aborts the rest, and already-placed cache
    /// files are never rolled back.
    pub fn resolve_range(
        &self,
        min_lon: f64,
        min_lat: f64,
        max_lon: f64,
        max_lat: f64,
    ) -> Vec<RasterHandle> {
        let tiles = coverage::tiles_covering(min_lon, min_lat, max_lon, max_lat);
        let mut handles = Vec::with_capacity(tiles.len());
        for coord in tiles {
            match self.resolve_tile(coord) {
                Ok(Some(handle)) => handles.push(handle),
                Ok(None) => {}
                Err(err) => warn!(tile = %coord, error = %err, "tile resolution failed"),
            }
        }
        handles
    }
}
