//! Resolver configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::locator::DEFAULT_INDEX_URL;

/// Default directory for the local tile cache.
const DEFAULT_CACHE_ROOT: &str = "elevation_cache";

/// Default bound on each network call, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settings for a [`TileResolver`](crate::TileResolver).
///
/// All fields have defaults, so a partial YAML file (or none at all)
/// works:
///
/// ```yaml
/// cache_root: /var/cache/demtiles
/// timeout_secs: 30
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Root directory of the local cache tree.
    pub cache_root: PathBuf,
    /// Base URL of the remote tile index.
    pub index_url: String,
    /// Bound on each network call, in seconds.
    pub timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_root: PathBuf::from(DEFAULT_CACHE_ROOT),
            index_url: DEFAULT_INDEX_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ResolverConfig {
    /// Network timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
