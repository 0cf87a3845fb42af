//! Shared test utilities for the provisioner crate.
#![expect(
    clippy::expect_used,
    reason = "fixture construction failures should abort the test"
)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Cursor, Write};

use crate::artefact::download::{ArchiveFetcher, FetchError, archive_url};
use crate::artefact::identifier::{CollectionName, VersionIdentifier};
use crate::artefact::target::PlatformTarget;

/// Base URL used by [`StubFetcher`] when reporting failures.
pub const STUB_BASE_URL: &str = "https://artefacts.example.test";

/// Build an in-memory zip archive holding `entries` as (path, contents).
///
/// # Panics
///
/// Panics if the zip writer rejects an entry.
#[must_use]
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .expect("start zip entry");
        writer.write_all(contents).expect("write zip entry");
    }
    writer.finish().expect("finish zip archive").into_inner()
}

/// Return the archive-relative path of `artifact`'s build for `target`.
#[must_use]
pub fn archive_entry_path(library_prefix: &str, artifact: &str, target: PlatformTarget) -> String {
    let triple = target.triple();
    let file_name = target.library_file_name(&format!("{library_prefix}{artifact}"));
    format!("{triple}/{triple}/release/{file_name}")
}

/// Return the contents [`collection_archive`] stores for one build.
#[must_use]
pub fn library_contents(artifact: &str, target: PlatformTarget) -> Vec<u8> {
    format!("{artifact} built for {}", target.triple()).into_bytes()
}

/// Build a collection archive laid out as the artefact host publishes it,
/// with one build per target for every artifact.
#[must_use]
pub fn collection_archive(library_prefix: &str, artifacts: &[&str]) -> Vec<u8> {
    collection_archive_for(library_prefix, artifacts, &PlatformTarget::ALL)
}

/// Build a collection archive containing builds for `targets` only.
#[must_use]
pub fn collection_archive_for(
    library_prefix: &str,
    artifacts: &[&str],
    targets: &[PlatformTarget],
) -> Vec<u8> {
    let entries: Vec<(String, Vec<u8>)> = artifacts
        .iter()
        .flat_map(|artifact| {
            targets.iter().map(move |target| {
                (
                    archive_entry_path(library_prefix, artifact, *target),
                    library_contents(artifact, *target),
                )
            })
        })
        .collect();
    let borrowed: Vec<(&str, &[u8])> = entries
        .iter()
        .map(|(path, contents)| (path.as_str(), contents.as_slice()))
        .collect();
    zip_archive(&borrowed)
}

/// A stub [`ArchiveFetcher`] that replays canned responses per version and
/// records every request.
///
/// Versions without a canned response answer with HTTP 404.
#[derive(Debug, Default)]
pub struct StubFetcher {
    responses: HashMap<String, Result<Vec<u8>, FetchError>>,
    attempts: RefCell<Vec<(String, String)>>,
}

impl StubFetcher {
    /// Create a fetcher with no canned responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `archive` for `version`.
    #[must_use]
    pub fn serving(mut self, version: &str, archive: Vec<u8>) -> Self {
        self.responses.insert(version.to_owned(), Ok(archive));
        self
    }

    /// Fail requests for `version` with `error`.
    #[must_use]
    pub fn failing(mut self, version: &str, error: FetchError) -> Self {
        self.responses.insert(version.to_owned(), Err(error));
        self
    }

    /// Return the (collection, version) pairs requested so far, in order.
    #[must_use]
    pub fn attempts(&self) -> Vec<(String, String)> {
        self.attempts.borrow().clone()
    }

    /// Return the versions requested so far, in order.
    #[must_use]
    pub fn requested_versions(&self) -> Vec<String> {
        self.attempts
            .borrow()
            .iter()
            .map(|(_, version)| version.clone())
            .collect()
    }
}

impl ArchiveFetcher for StubFetcher {
    fn fetch(
        &self,
        collection: &CollectionName,
        version: &VersionIdentifier,
    ) -> Result<Vec<u8>, FetchError> {
        self.attempts
            .borrow_mut()
            .push((collection.to_string(), version.to_string()));
        self.responses.get(version.as_str()).map_or_else(
            || {
                Err(FetchError::BadStatus {
                    url: archive_url(STUB_BASE_URL, collection, version),
                    status: 404,
                })
            },
            Clone::clone,
        )
    }
}
