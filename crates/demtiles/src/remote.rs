//! Remote index protocol: redirect-based archive discovery.
//!
//! The remote service packs many tiles into one zip archive and exposes
//! discovery through redirect headers instead of a structured body: a GET
//! on a tile's index URL answers 404 for no coverage, or a 3xx whose
//! `Location` header points at the archive and whose `X-Zip-Path` header
//! names the requested member inside it. The headers are the payload, so
//! the HTTP client must not follow redirects itself.

use reqwest::header::LOCATION;
use reqwest::StatusCode;
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

use crate::{DemError, Result};

/// Header naming the requested member's path inside the archive.
const ZIP_PATH_HEADER: &str = "x-zip-path";

/// Outcome of querying the index for one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteLookup {
    /// The index redirected to the archive holding this tile.
    Redirect {
        /// Absolute URL of the zip archive.
        archive_url: String,
        /// Path of the requested member inside the archive.
        member_path: String,
    },
    /// The remote source has no coverage for this tile.
    NotCovered,
    /// The index answered with a status this client does not handle.
    /// Terminal for the tile; not retried.
    Error {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
}

/// Remote side of the pipeline: index lookup and archive download.
///
/// A trait so tests (and embedders with their own transport) can supply a
/// scripted implementation; [`HttpIndex`] is the production one.
pub trait RemoteIndex {
    /// Query the index for a tile's canonical URL.
    fn resolve_index(&self, url: &str) -> Result<RemoteLookup>;

    /// Download the archive behind a redirect. Only 2xx is acceptable.
    fn fetch_archive(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTP implementation of [`RemoteIndex`] over a shared blocking client.
#[derive(Debug)]
pub struct HttpIndex {
    client: reqwest::blocking::Client,
}

impl HttpIndex {
    /// Build a client with a bounded timeout that reports redirects to the
    /// caller instead of following them.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

impl RemoteIndex for HttpIndex {
    fn resolve_index(&self, url: &str) -> Result<RemoteLookup> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(RemoteLookup::NotCovered);
        }

        if status.is_redirection() {
            let location = header_str(&resp, LOCATION.as_str());
            let member = header_str(&resp, ZIP_PATH_HEADER);
            debug!(%url, ?location, ?member, "index redirect");
            return redirect_lookup(url, location.as_deref(), member.as_deref());
        }

        Ok(RemoteLookup::Error {
            status: status.as_u16(),
            body: resp.text().unwrap_or_default(),
        })
    }

    fn fetch_archive(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(DemError::RemoteStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }
        Ok(resp.bytes()?.to_vec())
    }
}

fn header_str(resp: &reqwest::blocking::Response, name: &str) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Turn a redirect's headers into a [`RemoteLookup::Redirect`].
///
/// A 3xx missing either header, or carrying a `Location` that cannot be
/// resolved against the request URL, violates the protocol and is fatal.
fn redirect_lookup(
    request_url: &str,
    location: Option<&str>,
    member_path: Option<&str>,
) -> Result<RemoteLookup> {
    let location = location.ok_or_else(|| DemError::ProtocolViolation {
        url: request_url.to_string(),
        reason: "redirect without a Location header".to_string(),
    })?;
    let member_path = member_path.ok_or_else(|| DemError::ProtocolViolation {
        url: request_url.to_string(),
        reason: format!("redirect without an {} header", ZIP_PATH_HEADER),
    })?;

    let base = Url::parse(request_url).map_err(|err| DemError::ProtocolViolation {
        url: request_url.to_string(),
        reason: format!("request URL is not absolute: {err}"),
    })?;
    let archive_url = base.join(location).map_err(|err| DemError::ProtocolViolation {
        url: request_url.to_string(),
        reason: format!("unresolvable Location {location:?}: {err}"),
    })?;

    Ok(RemoteLookup::Redirect {
        archive_url: archive_url.to_string(),
        member_path: member_path.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_URL: &str = "http://example.com/elevation/index/N46E008.hgt";

    #[test]
    fn test_redirect_with_absolute_location() {
        let lookup = redirect_lookup(
            INDEX_URL,
            Some("http://host/archives/block12.zip"),
            Some("/N46E008.hgt"),
        )
        .unwrap();
        assert_eq!(
            lookup,
            RemoteLookup::Redirect {
                archive_url: "http://host/archives/block12.zip".to_string(),
                member_path: "/N46E008.hgt".to_string(),
            }
        );
    }

    #[test]
    fn test_redirect_with_relative_location() {
        let lookup =
            redirect_lookup(INDEX_URL, Some("/archives/block12.zip"), Some("/N46E008.hgt"))
                .unwrap();
        match lookup {
            RemoteLookup::Redirect { archive_url, .. } => {
                assert_eq!(archive_url, "http://example.com/archives/block12.zip");
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test]
    fn test_redirect_missing_location_is_protocol_violation() {
        let err = redirect_lookup(INDEX_URL, None, Some("/N46E008.hgt")).unwrap_err();
        assert!(matches!(err, DemError::ProtocolViolation { .. }));
    }

    #[test]
    fn test_redirect_missing_zip_path_is_protocol_violation() {
        let err = redirect_lookup(INDEX_URL, Some("/archives/block12.zip"), None).unwrap_err();
        assert!(matches!(err, DemError::ProtocolViolation { .. }));
    }

    #[test]
    fn test_http_index_builds() {
        HttpIndex::new(Duration::from_secs(30)).unwrap();
    }
}
