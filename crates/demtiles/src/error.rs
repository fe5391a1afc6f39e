//! Error types for the demtiles crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving elevation tiles.
#[derive(Debug, Error)]
pub enum DemError {
    /// I/O error touching the cache tree or scratch space.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failure (connect, timeout, body read).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The index redirected without the metadata the protocol requires.
    #[error("protocol violation from index at {url}: {reason}")]
    ProtocolViolation {
        /// URL of the request that produced the bad response.
        url: String,
        /// What was missing or malformed.
        reason: String,
    },

    /// The remote answered with a status this client does not handle.
    #[error("unexpected status {status} from {url}: {body}")]
    RemoteStatus {
        /// URL of the request.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The downloaded archive could not be opened or extracted.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The requested member was not present after dispersing the archive.
    #[error("member {member} missing after extracting archive from {archive_url}")]
    MemberMissing {
        /// URL the archive was downloaded from.
        archive_url: String,
        /// Path of the member inside the archive, per the index redirect.
        member: String,
    },

    /// The raster file exists but is not a well-formed HGT grid.
    #[error("malformed raster {path}: {reason}")]
    Raster {
        /// Path of the offending file.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// Coordinate is outside the bounds of the sampled tile.
    #[error("coordinate ({lat}, {lon}) is outside the tile")]
    OutOfBounds {
        /// Requested latitude.
        lat: f64,
        /// Requested longitude.
        lon: f64,
    },
}
