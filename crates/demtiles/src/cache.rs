//! On-disk cache store for raster tiles and negative-coverage markers.
//!
//! The cache tree is append-only and shared: other processes may be
//! resolving the same tiles at the same time. Every write here is
//! idempotent (`create_dir_all` for shards, overwrite for markers,
//! rename into a deterministic final path for rasters), so the worst
//! cross-process race is two callers downloading and placing the same
//! file, which is harmless.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{DemError, Result};

/// Suffix of the sentinel file recording "the remote has no coverage here".
const ABSENT_EXT: &str = "404";

/// State of one tile in the local cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    /// The raster file exists at this path.
    Present(PathBuf),
    /// A sentinel records that the remote source does not cover this tile.
    Absent,
    /// Neither file exists; the tile has never been resolved.
    Unknown,
}

/// Path of the negative-cache sentinel for a raster path (same stem,
/// `.404` suffix).
pub fn absent_marker_path(cache_path: &Path) -> PathBuf {
    cache_path.with_extension(ABSENT_EXT)
}

/// Look up a tile by its computed cache path.
///
/// Decided purely by file presence; never touches the network.
pub fn lookup(cache_path: &Path) -> CacheEntry {
    if cache_path.exists() {
        return CacheEntry::Present(cache_path.to_path_buf());
    }
    if absent_marker_path(cache_path).exists() {
        return CacheEntry::Absent;
    }
    CacheEntry::Unknown
}

/// Create a shard directory if it does not exist yet.
///
/// Idempotent. Permissions are set on the directory being created here,
/// so later writers (possibly other processes under other uids) can place
/// files into it.
pub fn ensure_dir(cache_dir: &Path) -> Result<()> {
    if cache_dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(cache_dir)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(cache_dir, fs::Permissions::from_mode(0o777))?;
    }
    Ok(())
}

/// Record that the remote source has no coverage for this tile.
///
/// The sentinel's contents are the origin URL that produced the negative
/// answer, for diagnostics only. Overwrites any existing marker.
pub fn write_absent_marker(cache_path: &Path, origin_url: &str) -> Result<()> {
    if let Some(dir) = cache_path.parent() {
        ensure_dir(dir)?;
    }
    fs::write(absent_marker_path(cache_path), format!("{origin_url}\n"))?;
    Ok(())
}

/// Move a dispersed file into its final cache location.
///
/// The shard directory is created first; the file is made world-readable
/// so unrelated consumers of the shared cache can open it. The source must
/// be on the same filesystem as the cache (scratch workspaces are created
/// under the cache root to guarantee this).
pub fn place(src: &Path, cache_path: &Path) -> Result<()> {
    if let Some(dir) = cache_path.parent() {
        ensure_dir(dir)?;
    }
    fs::rename(src, cache_path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(cache_path, fs::Permissions::from_mode(0o666))?;
    }
    Ok(())
}

/// Open a cached raster file.
///
/// Hard error if the file is missing or malformed: by the time this is
/// called the pipeline has established that the file should exist.
pub fn open(cache_path: &Path) -> Result<crate::RasterHandle> {
    if !cache_path.exists() {
        return Err(DemError::Raster {
            path: cache_path.to_path_buf(),
            reason: "expected cached raster is missing".to_string(),
        });
    }
    crate::RasterHandle::open(cache_path)
}
