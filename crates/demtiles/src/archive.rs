//! Archive dispersal: one downloaded zip populates many cache entries.
//!
//! The index redirects to archives that pack a block of neighbouring
//! tiles together. Dispersal extracts the whole archive into a scratch
//! workspace and relocates every qualifying member into its own
//! hash-sharded cache location, so sibling tiles resolve from disk with
//! no further network I/O.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::locator::TileLocator;
use crate::{cache, DemError, RasterHandle, Result};

/// Extract an archive and disperse its members into the cache, then open
/// the originally requested tile.
///
/// The scratch workspace lives under the cache root (same filesystem as
/// the final locations) and is removed on every exit path. Extraction
/// failure is fatal; a single member's placement failure is logged and
/// skipped so the remaining members still land.
pub(crate) fn disperse(
    locator: &TileLocator,
    archive_url: &str,
    member_path: &str,
    archive_bytes: &[u8],
    requested_cache_path: &Path,
) -> Result<RasterHandle> {
    cache::ensure_dir(locator.cache_root())?;
    let scratch = tempfile::Builder::new()
        .prefix("dem-")
        .suffix("-scratch")
        .tempdir_in(locator.cache_root())?;

    let archive_path = scratch.path().join("archive.zip");
    fs::write(&archive_path, archive_bytes)?;

    info!(url = %archive_url, bytes = archive_bytes.len(), "extracting archive");
    let file = fs::File::open(&archive_path)?;
    let mut archive = ZipArchive::new(file)?;
    archive.extract(scratch.path())?;

    disperse_members(locator, scratch.path());

    if !requested_cache_path.exists() {
        return Err(DemError::MemberMissing {
            archive_url: archive_url.to_string(),
            member: member_path.to_string(),
        });
    }
    cache::open(requested_cache_path)
}

/// Move every extracted raster into its own cache shard.
fn disperse_members(locator: &TileLocator, scratch: &Path) {
    for entry in WalkDir::new(scratch) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable scratch entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(OsStr::to_str) != Some(locator.raster_ext()) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(OsStr::to_str) else {
            continue;
        };

        let member = locator.locate_name(stem);
        debug!(member = stem, dest = %member.cache_path.display(), "placing tile");
        if let Err(err) = cache::place(path, &member.cache_path) {
            warn!(member = stem, error = %err, "failed to place tile, leaving as cache miss");
        }
    }
}
