//! End-to-end pipeline tests.
//!
//! The remote index and the fallback datasource are scripted, so these
//! tests run hermetically and can assert exactly how many network calls
//! each resolution performs.

use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use demtiles::{
    CacheEntry, DemError, FallbackSource, RasterHandle, RemoteIndex, RemoteLookup, Result,
    TileCoord, TileLocator, TileResolver,
};

const INDEX_URL: &str = "http://example.com/elevation/index";
const ARCHIVE_URL: &str = "http://host/archives/block12.zip";

/// Remote index driven by a fixed script, counting calls.
#[derive(Default)]
struct ScriptedIndex {
    lookups: HashMap<String, RemoteLookup>,
    archives: HashMap<String, Vec<u8>>,
    index_calls: Rc<Cell<usize>>,
    archive_calls: Rc<Cell<usize>>,
}

impl ScriptedIndex {
    fn lookup(mut self, tile: &str, result: RemoteLookup) -> Self {
        self.lookups
            .insert(format!("{INDEX_URL}/{tile}.hgt"), result);
        self
    }

    fn archive(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.archives.insert(url.to_string(), bytes);
        self
    }

    fn counters(&self) -> (Rc<Cell<usize>>, Rc<Cell<usize>>) {
        (self.index_calls.clone(), self.archive_calls.clone())
    }
}

impl RemoteIndex for ScriptedIndex {
    fn resolve_index(&self, url: &str) -> Result<RemoteLookup> {
        self.index_calls.set(self.index_calls.get() + 1);
        Ok(self
            .lookups
            .get(url)
            .cloned()
            .unwrap_or(RemoteLookup::NotCovered))
    }

    fn fetch_archive(&self, url: &str) -> Result<Vec<u8>> {
        self.archive_calls.set(self.archive_calls.get() + 1);
        Ok(self
            .archives
            .get(url)
            .cloned()
            .expect("unscripted archive URL"))
    }
}

/// Fallback returning a fixed raster (or nothing), counting calls.
struct ScriptedFallback {
    calls: Rc<Cell<usize>>,
    raster: Option<PathBuf>,
}

impl ScriptedFallback {
    fn none() -> Self {
        Self {
            calls: Rc::default(),
            raster: None,
        }
    }

    fn serving(path: PathBuf) -> Self {
        Self {
            calls: Rc::default(),
            raster: Some(path),
        }
    }
}

impl FallbackSource for ScriptedFallback {
    fn fetch(&self, _coord: TileCoord) -> Result<Option<RasterHandle>> {
        self.calls.set(self.calls.get() + 1);
        match &self.raster {
            Some(path) => RasterHandle::open(path).map(Some),
            None => Ok(None),
        }
    }
}

fn hgt_bytes(fill: i16) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(18);
    for _ in 0..9 {
        bytes.extend_from_slice(&fill.to_be_bytes());
    }
    bytes
}

fn zip_with(members: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    let mut writer = zip::ZipWriter::new(&mut cursor);
    for (name, bytes) in members {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap();
    cursor.into_inner()
}

fn redirect_to_block12(member: &str) -> RemoteLookup {
    RemoteLookup::Redirect {
        archive_url: ARCHIVE_URL.to_string(),
        member_path: format!("/{member}"),
    }
}

fn assert_no_scratch_left(cache_root: &Path) {
    let leftovers: Vec<_> = fs::read_dir(cache_root)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("dem-"))
        .collect();
    assert!(leftovers.is_empty(), "scratch dirs left behind: {leftovers:?}");
}

#[test]
fn test_not_covered_writes_sentinel_and_consults_fallback() {
    let root = tempfile::tempdir().unwrap();
    let locator = TileLocator::new(INDEX_URL, root.path());
    let index = ScriptedIndex::default().lookup("N46E007", RemoteLookup::NotCovered);
    let (index_calls, _) = index.counters();
    let fallback = ScriptedFallback::none();
    let fallback_calls = fallback.calls.clone();
    let resolver = TileResolver::with_parts(locator.clone(), index, fallback);

    let coord = TileCoord::new(46, 7);
    assert!(resolver.resolve_tile(coord).unwrap().is_none());
    assert_eq!(index_calls.get(), 1);
    assert_eq!(fallback_calls.get(), 1);

    // The sentinel sits next to the would-be raster and records the origin
    let location = locator.locate(coord);
    let sentinel = location.cache_path.with_extension("404");
    assert_eq!(sentinel.file_name().unwrap(), "N46E007.404");
    assert_eq!(
        fs::read_to_string(&sentinel).unwrap().trim(),
        format!("{INDEX_URL}/N46E007.hgt")
    );
    assert_eq!(resolver.cache_entry(coord), CacheEntry::Absent);

    // Re-resolution goes straight to the fallback, zero network calls
    assert!(resolver.resolve_tile(coord).unwrap().is_none());
    assert_eq!(index_calls.get(), 1);
    assert_eq!(fallback_calls.get(), 2);
}

#[test]
fn test_redirect_disperses_archive_and_caches_siblings() {
    let root = tempfile::tempdir().unwrap();
    let locator = TileLocator::new(INDEX_URL, root.path());
    let archive = zip_with(&[
        ("N46E008.hgt", hgt_bytes(100)),
        ("N47E008.hgt", hgt_bytes(200)),
    ]);
    let index = ScriptedIndex::default()
        .lookup("N46E008", redirect_to_block12("N46E008.hgt"))
        .archive(ARCHIVE_URL, archive);
    let (index_calls, archive_calls) = index.counters();
    let resolver = TileResolver::with_parts(locator.clone(), index, ScriptedFallback::none());

    let requested = TileCoord::new(46, 8);
    let handle = resolver.resolve_tile(requested).unwrap().unwrap();
    assert_eq!(handle.tile(), Some(requested));
    assert_eq!(handle.elevation(46.5, 8.5).unwrap(), Some(100.0));
    assert_eq!(index_calls.get(), 1);
    assert_eq!(archive_calls.get(), 1);
    assert_no_scratch_left(root.path());

    // The sibling packed in the same archive now resolves from disk alone
    let sibling = TileCoord::new(47, 8);
    let sibling_path = locator.locate(sibling).cache_path;
    assert_eq!(resolver.cache_entry(sibling), CacheEntry::Present(sibling_path));
    let handle = resolver.resolve_tile(sibling).unwrap().unwrap();
    assert_eq!(handle.elevation(47.5, 8.5).unwrap(), Some(200.0));
    assert_eq!(index_calls.get(), 1);
    assert_eq!(archive_calls.get(), 1);

    // So does the originally requested tile
    resolver.resolve_tile(requested).unwrap().unwrap();
    assert_eq!(index_calls.get(), 1);
    assert_eq!(archive_calls.get(), 1);
}

#[test]
fn test_remote_error_is_fatal_and_not_cached() {
    let root = tempfile::tempdir().unwrap();
    let locator = TileLocator::new(INDEX_URL, root.path());
    let index = ScriptedIndex::default().lookup(
        "N46E007",
        RemoteLookup::Error {
            status: 500,
            body: "index exploded".to_string(),
        },
    );
    let (index_calls, _) = index.counters();
    let fallback = ScriptedFallback::none();
    let fallback_calls = fallback.calls.clone();
    let resolver = TileResolver::with_parts(locator, index, fallback);

    let coord = TileCoord::new(46, 7);
    let err = resolver.resolve_tile(coord).unwrap_err();
    assert!(matches!(err, DemError::RemoteStatus { status: 500, .. }));

    // A failure is not a negative-cache entry: no sentinel, no fallback,
    // and the next attempt asks the remote again
    assert_eq!(resolver.cache_entry(coord), CacheEntry::Unknown);
    assert_eq!(fallback_calls.get(), 0);
    assert!(resolver.resolve_tile(coord).is_err());
    assert_eq!(index_calls.get(), 2);
}

#[test]
fn test_corrupt_archive_fails_tile_and_cleans_scratch() {
    let root = tempfile::tempdir().unwrap();
    let locator = TileLocator::new(INDEX_URL, root.path());
    let index = ScriptedIndex::default()
        .lookup("N46E008", redirect_to_block12("N46E008.hgt"))
        .archive(ARCHIVE_URL, b"not a zip archive".to_vec());
    let (index_calls, _) = index.counters();
    let resolver = TileResolver::with_parts(locator, index, ScriptedFallback::none());

    let coord = TileCoord::new(46, 8);
    let err = resolver.resolve_tile(coord).unwrap_err();
    assert!(matches!(err, DemError::Archive(_)));
    assert_no_scratch_left(root.path());

    // Nothing was cached, so the tile is retried on demand
    assert_eq!(resolver.cache_entry(coord), CacheEntry::Unknown);
    resolver.resolve_tile(coord).unwrap_err();
    assert_eq!(index_calls.get(), 2);
}

#[test]
fn test_resolve_range_skips_uncovered_and_failed_tiles() {
    let root = tempfile::tempdir().unwrap();
    let locator = TileLocator::new(INDEX_URL, root.path());
    let archive = zip_with(&[("N46E008.hgt", hgt_bytes(100))]);
    let index = ScriptedIndex::default()
        .lookup("N46E008", redirect_to_block12("N46E008.hgt"))
        .lookup("N46E007", RemoteLookup::NotCovered)
        .lookup(
            "N46E009",
            RemoteLookup::Error {
                status: 503,
                body: "unavailable".to_string(),
            },
        )
        .archive(ARCHIVE_URL, archive);
    let resolver = TileResolver::with_parts(locator, index, ScriptedFallback::none());

    // Three covered tiles: one resolves, one is uncovered, one fails.
    // The aggregate never raises and returns only the success.
    let handles = resolver.resolve_range(7.5, 46.5, 9.5, 46.5);
    assert_eq!(handles.len(), 1);
    assert_eq!(handles[0].tile(), Some(TileCoord::new(46, 8)));
}

#[test]
fn test_resolve_range_includes_fallback_results() {
    let root = tempfile::tempdir().unwrap();
    let locator = TileLocator::new(INDEX_URL, root.path());

    // A raster the fallback serves for tiles the index does not cover
    let side_dir = tempfile::tempdir().unwrap();
    let fallback_tile = side_dir.path().join("N46E007.hgt");
    fs::write(&fallback_tile, hgt_bytes(42)).unwrap();

    let archive = zip_with(&[("N46E008.hgt", hgt_bytes(100))]);
    let index = ScriptedIndex::default()
        .lookup("N46E007", RemoteLookup::NotCovered)
        .lookup("N46E008", redirect_to_block12("N46E008.hgt"))
        .archive(ARCHIVE_URL, archive);
    let fallback = ScriptedFallback::serving(fallback_tile);
    let fallback_calls = fallback.calls.clone();
    let resolver = TileResolver::with_parts(locator, index, fallback);

    let handles = resolver.resolve_range(7.5, 46.5, 8.5, 46.5);
    assert_eq!(handles.len(), 2);
    assert_eq!(fallback_calls.get(), 1);
}
