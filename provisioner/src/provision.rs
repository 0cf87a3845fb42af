//! Provisioning orchestrator.
//!
//! Drives one request through an explicit state machine:
//!
//! ```text
//! Checking ──satisfied──────────────────────────────▶ Done(Satisfied)
//!    │ missing
//!    ▼
//! Fetching(primary) ──ok──▶ Installing(primary) ──ok──▶ Done(Satisfied)
//!    │ failed                     │ failed
//!    ▼                            ▼
//! Fetching(fallback)* ──ok──▶ Installing(fallback) ──▶ Done(..)
//! ```
//!
//! `*` only when the policy permits it, the request names a fallback that
//! differs from the primary, and the failing attempt was the primary one.
//! There is never more than one fallback attempt.

use log::{debug, info};
use serde::Serialize;
use std::io::Write;

use crate::artefact::download::ArchiveFetcher;
use crate::artefact::extraction::ArchiveExtractor;
use crate::artefact::identifier::{ArtifactName, CollectionName, VersionIdentifier};
use crate::artefact::mapping::{DestinationMapping, DestinationResolver};
use crate::install::ArchiveInstaller;
use crate::output::write_stderr_line;
use crate::presence::is_satisfied;
use crate::scratch::ScratchArea;

/// The fallback label used when a request does not name one.
pub const DEFAULT_FALLBACK_VERSION: &str = "last_build";

/// One collection to provision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    /// The archive group to fetch.
    pub collection: CollectionName,
    /// The components installed from the collection archive.
    pub components: Vec<ArtifactName>,
    /// The version fetched first.
    pub primary: VersionIdentifier,
    /// The version fetched when the primary attempt fails, policy permitting.
    pub fallback: Option<VersionIdentifier>,
}

impl ProvisionRequest {
    /// Resolve the merged destination mapping for every component.
    #[must_use]
    pub fn mapping(&self, resolver: &DestinationResolver) -> DestinationMapping {
        resolver.resolve_all(&self.components)
    }
}

/// Controls when the fallback version is attempted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProvisionPolicy {
    /// Whether a failed primary attempt may be retried with the fallback
    /// version. Typically enabled in continuous integration only.
    pub allow_fallback: bool,
    /// Whether a corrupt archive or a missing entry, not only a failed
    /// fetch, may trigger the fallback. Local filesystem failures never do.
    pub fallback_on_install_failure: bool,
}

/// The result of provisioning one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProvisionOutcome {
    /// Every destination is present.
    Satisfied {
        /// The version installed by this run, or `None` when nothing needed
        /// installing.
        installed: Option<VersionIdentifier>,
    },
    /// Provisioning failed and no fallback succeeded.
    Failed {
        /// A diagnostic naming the collection, version, and cause.
        reason: String,
    },
}

impl ProvisionOutcome {
    /// Whether every destination ended up present.
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied { .. })
    }
}

/// The outcome of one request together with the versions fetched for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    /// The collection the request named.
    pub collection: CollectionName,
    /// Versions fetched, in order. Empty when nothing was missing.
    pub attempts: Vec<VersionIdentifier>,
    /// The final outcome.
    pub outcome: ProvisionOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Primary,
    Fallback,
}

enum State {
    Checking,
    Fetching(Attempt),
    Installing(Attempt, Vec<u8>),
    Done(ProvisionOutcome),
}

/// Composes presence checking, fetching, and installation.
pub struct Provisioner<'a> {
    fetcher: &'a dyn ArchiveFetcher,
    extractor: &'a dyn ArchiveExtractor,
    resolver: DestinationResolver,
    scratch: ScratchArea,
    policy: ProvisionPolicy,
    quiet: bool,
}

impl<'a> Provisioner<'a> {
    /// Create a provisioner.
    #[must_use]
    pub const fn new(
        fetcher: &'a dyn ArchiveFetcher,
        extractor: &'a dyn ArchiveExtractor,
        resolver: DestinationResolver,
        scratch: ScratchArea,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            resolver,
            scratch,
            policy: ProvisionPolicy {
                allow_fallback: false,
                fallback_on_install_failure: false,
            },
            quiet: false,
        }
    }

    /// Set the fallback policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: ProvisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Suppress progress output. Failures are still reported.
    #[must_use]
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Provision every request independently, continuing past failures.
    #[must_use]
    pub fn provision_all(
        &self,
        requests: &[ProvisionRequest],
        stderr: &mut dyn Write,
    ) -> Vec<ProvisionReport> {
        requests
            .iter()
            .map(|request| self.provision(request, stderr))
            .collect()
    }

    /// Provision one request.
    ///
    /// Leftovers from an earlier run are removed from the scratch area first,
    /// whatever path the request then takes.
    ///
    /// Never panics or returns an error: stage failures are reported on
    /// `stderr` and folded into [`ProvisionOutcome::Failed`].
    #[must_use]
    pub fn provision(
        &self,
        request: &ProvisionRequest,
        stderr: &mut dyn Write,
    ) -> ProvisionReport {
        self.scratch.discard();
        let mapping = request.mapping(&self.resolver);
        let mut attempts = Vec::new();
        let mut state = State::Checking;

        loop {
            state = match state {
                State::Checking => self.check(request, &mapping, stderr),
                State::Fetching(attempt) => {
                    let version = self.version_for(request, attempt);
                    attempts.push(version.clone());
                    self.fetch(request, attempt, version, stderr)
                }
                State::Installing(attempt, archive) => {
                    self.install(request, attempt, &archive, &mapping, stderr)
                }
                State::Done(outcome) => {
                    if let ProvisionOutcome::Failed { reason } = &outcome {
                        write_stderr_line(stderr, format!("error: {reason}"));
                    }
                    return ProvisionReport {
                        collection: request.collection.clone(),
                        attempts,
                        outcome,
                    };
                }
            };
        }
    }

    fn check(
        &self,
        request: &ProvisionRequest,
        mapping: &DestinationMapping,
        stderr: &mut dyn Write,
    ) -> State {
        if is_satisfied(mapping) {
            debug!("{} already provisioned", request.collection);
            return State::Done(ProvisionOutcome::Satisfied { installed: None });
        }
        self.progress(
            stderr,
            format!(
                "Missing {} native libraries. Installing {} {} into {}...",
                request.collection,
                request.collection,
                request.primary,
                self.resolver.destination_root()
            ),
        );
        State::Fetching(Attempt::Primary)
    }

    fn fetch(
        &self,
        request: &ProvisionRequest,
        attempt: Attempt,
        version: &VersionIdentifier,
        stderr: &mut dyn Write,
    ) -> State {
        info!("fetching {} {version}", request.collection);
        self.fetcher.fetch(&request.collection, version).map_or_else(
            |err| {
                let reason = format!("failed to fetch {} {version}: {err}", request.collection);
                self.after_failure(request, attempt, reason, true, stderr)
            },
            |archive| State::Installing(attempt, archive),
        )
    }

    fn install(
        &self,
        request: &ProvisionRequest,
        attempt: Attempt,
        archive: &[u8],
        mapping: &DestinationMapping,
        stderr: &mut dyn Write,
    ) -> State {
        let version = self.version_for(request, attempt);
        let installer = ArchiveInstaller::new(self.extractor, &self.scratch);
        match installer.install(archive, mapping) {
            Ok(installed) => {
                self.progress(
                    stderr,
                    format!(
                        "Installed {} {version} ({} files).",
                        request.collection,
                        installed.len()
                    ),
                );
                State::Done(ProvisionOutcome::Satisfied {
                    installed: Some(version.clone()),
                })
            }
            Err(err) => {
                let eligible = self.policy.fallback_on_install_failure && err.is_archive_fault();
                let reason = format!("failed to install {} {version}: {err}", request.collection);
                self.after_failure(request, attempt, reason, eligible, stderr)
            }
        }
    }

    /// Decide between the fallback attempt and a terminal failure.
    fn after_failure(
        &self,
        request: &ProvisionRequest,
        attempt: Attempt,
        reason: String,
        eligible: bool,
        stderr: &mut dyn Write,
    ) -> State {
        let retry = match (attempt, eligible) {
            (Attempt::Primary, true) => self.fallback_for(request),
            _ => None,
        };
        let Some(fallback) = retry else {
            return State::Done(ProvisionOutcome::Failed { reason });
        };
        write_stderr_line(stderr, format!("warning: {reason}"));
        self.progress(
            stderr,
            format!("Retrying {} with fallback version {fallback}...", request.collection),
        );
        State::Fetching(Attempt::Fallback)
    }

    fn fallback_for<'r>(&self, request: &'r ProvisionRequest) -> Option<&'r VersionIdentifier> {
        if !self.policy.allow_fallback {
            return None;
        }
        request
            .fallback
            .as_ref()
            .filter(|fallback| **fallback != request.primary)
    }

    fn version_for<'r>(
        &self,
        request: &'r ProvisionRequest,
        attempt: Attempt,
    ) -> &'r VersionIdentifier {
        match attempt {
            Attempt::Primary => &request.primary,
            Attempt::Fallback => self.fallback_for(request).unwrap_or(&request.primary),
        }
    }

    fn progress(&self, stderr: &mut dyn Write, message: impl std::fmt::Display) {
        if !self.quiet {
            write_stderr_line(stderr, message);
        }
    }
}

#[cfg(test)]
#[path = "provision_tests.rs"]
mod tests;
