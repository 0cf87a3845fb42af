//! Native library provisioner.
//!
//! Ensures that prebuilt native libraries for every supported platform
//! target are present in a project's resource tree before a build. Missing
//! libraries are fetched as one archive per collection from the artefact
//! host, extracted into a scratch area, and installed all at once. The
//! `native-provisioner` binary wraps this library; tests drive it through
//! the [`ArchiveFetcher`](artefact::download::ArchiveFetcher) and
//! [`ArchiveExtractor`](artefact::extraction::ArchiveExtractor) seams.
//!
//! # Modules
//!
//! - [`artefact`] - Identifiers, targets, destination mapping, download, and extraction
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - `provisioner.toml` loading and fallback policy resolution
//! - [`error`] - Errors that abort a run
//! - [`install`] - All-or-nothing archive installation
//! - [`output`] - Diagnostics, summaries, and the JSON report
//! - [`presence`] - Destination presence checks
//! - [`provision`] - The provisioning state machine
//! - [`scratch`] - Scratch area lifecycle

pub mod artefact;
pub mod cli;
pub mod config;
pub mod error;
pub mod install;
pub mod output;
pub mod presence;
pub mod provision;
pub mod scratch;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
