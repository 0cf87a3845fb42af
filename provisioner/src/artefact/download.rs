//! Archive download from the artefact host.
//!
//! Provides a trait-based abstraction for fetching a collection archive so
//! that the orchestrator can be exercised without network access. The
//! fetcher performs exactly one request per call; retrying with another
//! version is the orchestrator's decision.

use log::debug;
use std::io::Read;
use std::time::Duration;

use super::identifier::{CollectionName, VersionIdentifier};

/// The artefact host serving collection archives.
pub const DEFAULT_BASE_URL: &str = "https://package.cosmian.com";

/// The archive file name published for every collection version.
pub const ARCHIVE_FILE_NAME: &str = "all.zip";

const MAX_REDIRECTS: u32 = 10;

/// Trait for fetching collection archives.
///
/// # Examples
///
/// ```
/// use native_provisioner::artefact::download::HttpFetcher;
///
/// let fetcher = HttpFetcher::new("https://package.cosmian.com", None);
/// // Use fetcher.fetch(&collection, &version) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveFetcher {
    /// Fetch the archive for `collection` at `version` and return its bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::BadStatus`] when the host answers with anything
    /// other than HTTP 200, and [`FetchError::Transport`] when the host
    /// cannot be reached or the body cannot be read.
    fn fetch(
        &self,
        collection: &CollectionName,
        version: &VersionIdentifier,
    ) -> Result<Vec<u8>, FetchError>;
}

/// Errors arising from archive downloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The host answered, but not with HTTP 200.
    #[error("{url} answered with HTTP status {status}")]
    BadStatus {
        /// The URL that was requested.
        url: String,
        /// The status code returned.
        status: u16,
    },

    /// DNS, connection, TLS, timeout, or body read failure.
    #[error("request to {url} failed: {reason}")]
    Transport {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },
}

/// Build the archive URL for a collection version.
///
/// # Examples
///
/// ```
/// use native_provisioner::artefact::download::archive_url;
/// use native_provisioner::artefact::identifier::{CollectionName, VersionIdentifier};
///
/// let collection = CollectionName::try_from("findex").expect("valid");
/// let version = VersionIdentifier::try_from("v2.0.0").expect("valid");
/// assert_eq!(
///     archive_url("https://package.cosmian.com/", &collection, &version),
///     "https://package.cosmian.com/findex/v2.0.0/all.zip",
/// );
/// ```
#[must_use]
pub fn archive_url(
    base_url: &str,
    collection: &CollectionName,
    version: &VersionIdentifier,
) -> String {
    let base = base_url.trim_end_matches('/');
    format!("{base}/{collection}/{version}/{ARCHIVE_FILE_NAME}")
}

/// HTTP fetcher using `ureq`.
pub struct HttpFetcher {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher for `base_url`.
    ///
    /// `timeout` bounds each whole request when set; otherwise the
    /// transport's defaults apply.
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(MAX_REDIRECTS)
            .timeout_global(timeout)
            .build();
        Self {
            base_url: base_url.into(),
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl ArchiveFetcher for HttpFetcher {
    fn fetch(
        &self,
        collection: &CollectionName,
        version: &VersionIdentifier,
    ) -> Result<Vec<u8>, FetchError> {
        let url = archive_url(&self.base_url, collection, version);
        debug!("GET {url}");

        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| transport_error(&url, &e))?;

        let status = response.status().as_u16();
        classify_status(&url, status)?;

        let mut bytes = Vec::new();
        response
            .into_body()
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| transport_error(&url, &e))?;
        debug!("received {} bytes from {url}", bytes.len());
        Ok(bytes)
    }
}

/// Accept only HTTP 200; every other status is a failed fetch.
fn classify_status(url: &str, status: u16) -> Result<(), FetchError> {
    if status == 200 {
        Ok(())
    } else {
        Err(FetchError::BadStatus {
            url: url.to_owned(),
            status,
        })
    }
}

fn transport_error(url: &str, err: &dyn std::fmt::Display) -> FetchError {
    FetchError::Transport {
        url: url.to_owned(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    #![expect(
        clippy::expect_used,
        reason = "tests abort on fixture setup failures"
    )]

    use super::*;
    use rstest::rstest;

    fn ids(collection: &str, version: &str) -> (CollectionName, VersionIdentifier) {
        (
            CollectionName::try_from(collection).expect("valid collection"),
            VersionIdentifier::try_from(version).expect("valid version"),
        )
    }

    #[rstest]
    #[case::plain("https://package.cosmian.com")]
    #[case::trailing_slash("https://package.cosmian.com/")]
    fn archive_url_substitutes_collection_and_version(#[case] base: &str) {
        let (collection, version) = ids("cover_crypt", "v8.0.2");
        assert_eq!(
            archive_url(base, &collection, &version),
            "https://package.cosmian.com/cover_crypt/v8.0.2/all.zip"
        );
    }

    #[test]
    fn archive_url_keeps_build_labels_verbatim() {
        let (collection, version) = ids("findex", "last_build");
        assert!(archive_url(DEFAULT_BASE_URL, &collection, &version).ends_with("/findex/last_build/all.zip"));
    }

    #[test]
    fn status_200_is_accepted() {
        assert_eq!(classify_status("https://example.test/a", 200), Ok(()));
    }

    #[rstest]
    #[case::no_content(204)]
    #[case::not_found(404)]
    #[case::server_error(500)]
    fn other_statuses_are_bad_status(#[case] status: u16) {
        let err = classify_status("https://example.test/a", status).expect_err("expected error");
        assert_eq!(
            err,
            FetchError::BadStatus {
                url: "https://example.test/a".to_owned(),
                status,
            }
        );
    }

    #[test]
    fn bad_status_message_includes_url_and_status() {
        let err = FetchError::BadStatus {
            url: "https://example.test/findex/v1/all.zip".to_owned(),
            status: 404,
        };
        let message = err.to_string();
        assert!(message.contains("404"));
        assert!(message.contains("findex/v1/all.zip"));
    }

    #[test]
    fn unreachable_host_is_transport_error() {
        // Port 9 on loopback is the discard service and is closed on test hosts.
        let fetcher = HttpFetcher::new("http://127.0.0.1:9", Some(Duration::from_secs(5)));
        let (collection, version) = ids("findex", "v2.0.0");
        let err = fetcher
            .fetch(&collection, &version)
            .expect_err("expected connection failure");
        assert!(
            matches!(err, FetchError::Transport { ref url, .. } if url.ends_with("/findex/v2.0.0/all.zip")),
            "unexpected error: {err:?}"
        );
    }
}
